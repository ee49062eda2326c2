//! Test helpers for Web API integration tests.

use std::sync::Arc;

use axum_test::TestServer;
use jsonwebtoken::{encode, EncodingKey, Header};
use tempfile::TempDir;

use nimbus::file::FileStorage;
use nimbus::web::handlers::AppState;
use nimbus::web::middleware::{JwtClaims, JwtState};
use nimbus::web::router::{create_health_router, create_router};
use nimbus::Database;

/// Shared secret for minting test tokens.
pub const TEST_JWT_SECRET: &str = "test-secret-key-for-testing-only";

/// Per-file upload cap for tests.
pub const TEST_MAX_FILE_SIZE: u64 = 8 * 1024 * 1024;

/// A running test API with its backing state.
pub struct TestApp {
    pub server: TestServer,
    pub db: Arc<Database>,
    pub storage: FileStorage,
    // Keeps the storage directory alive for the test's duration
    _storage_dir: TempDir,
}

/// Create a test server with an in-memory database and temp storage.
pub async fn create_test_app() -> TestApp {
    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");
    let shared_db = Arc::new(db);

    let storage_dir = TempDir::new().expect("Failed to create temp storage");
    let storage = FileStorage::new(storage_dir.path()).expect("Failed to create storage");

    let app_state = Arc::new(AppState::new(
        shared_db.clone(),
        storage.clone(),
        TEST_MAX_FILE_SIZE,
    ));
    let jwt_state = Arc::new(JwtState::new(TEST_JWT_SECRET));

    let router = create_router(app_state, jwt_state, &[]).merge(create_health_router());
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp {
        server,
        db: shared_db,
        storage,
        _storage_dir: storage_dir,
    }
}

/// Mint a valid bearer token for the given user id.
pub fn auth_header(user_id: &str) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = JwtClaims {
        sub: user_id.to_string(),
        email: Some(format!("{user_id}@example.com")),
        first_name: Some("Test".to_string()),
        last_name: Some("User".to_string()),
        iat: now as u64,
        exp: (now + 3600) as u64,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("Failed to encode test token");

    format!("Bearer {token}")
}
