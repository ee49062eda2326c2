//! API handlers for the Web API.

pub mod file;
pub mod folder;
pub mod share;
pub mod user;

pub use file::*;
pub use folder::*;
pub use share::*;
pub use user::*;

use std::sync::Arc;

use crate::db::{UpsertUser, UserRepository};
use crate::file::FileStorage;
use crate::web::error::ApiError;
use crate::web::middleware::JwtClaims;
use crate::Database;

/// Shared database handle.
pub type SharedDatabase = Arc<Database>;

/// Shared application state for handlers.
pub struct AppState {
    /// Database handle.
    pub db: SharedDatabase,
    /// Object storage.
    pub storage: FileStorage,
    /// Per-file upload size cap in bytes.
    pub max_file_size: u64,
}

impl AppState {
    /// Create a new application state.
    pub fn new(db: SharedDatabase, storage: FileStorage, max_file_size: u64) -> Self {
        Self {
            db,
            storage,
            max_file_size,
        }
    }
}

/// Build an upsert from verified token claims.
pub(crate) fn upsert_from_claims(claims: &JwtClaims) -> UpsertUser {
    let mut upsert = UpsertUser::new(&claims.sub);
    if let Some(email) = &claims.email {
        upsert = upsert.with_email(email);
    }
    if let (Some(first), Some(last)) = (&claims.first_name, &claims.last_name) {
        upsert = upsert.with_name(first, last);
    }
    upsert
}

/// Make sure the token's user has a local row.
///
/// Rows created by handlers reference users by foreign key, and a valid
/// token can arrive before the user has ever hit an endpoint that
/// mirrors them.
pub(crate) async fn ensure_user(state: &AppState, claims: &JwtClaims) -> Result<(), ApiError> {
    UserRepository::new(state.db.pool())
        .upsert(&upsert_from_claims(claims))
        .await
        .map_err(|e| {
            tracing::error!("Failed to upsert user: {}", e);
            ApiError::internal("Failed to load user")
        })?;
    Ok(())
}
