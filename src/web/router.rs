//! Router configuration for the Web API.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    create_folder, create_share, delete_file, delete_folder, download_file, get_current_user,
    list_files, list_folders, list_shares, resolve_share, revoke_share, search_files,
    update_file, update_folder, upload_files, AppState,
};
use super::middleware::{create_cors_layer, jwt_auth, JwtState};
use crate::file::MAX_FILES_PER_BATCH;

/// Create the main API router.
pub fn create_router(
    app_state: Arc<AppState>,
    jwt_state: Arc<JwtState>,
    cors_origins: &[String],
) -> Router {
    // The upload route needs a body limit above axum's 2 MB default. A
    // single request may carry a full batch of maximum-size files, so the
    // cap is sized to the whole batch; per-file limits are enforced in
    // the service.
    let upload_body_limit = usize::try_from(
        app_state
            .max_file_size
            .saturating_mul(MAX_FILES_PER_BATCH as u64),
    )
    .unwrap_or(usize::MAX);

    let folder_routes = Router::new()
        .route("/", post(create_folder).get(list_folders))
        .route("/:id", put(update_folder).delete(delete_folder));

    let file_routes = Router::new()
        .route(
            "/upload",
            post(upload_files).layer(DefaultBodyLimit::max(upload_body_limit)),
        )
        .route("/", get(list_files))
        .route("/search", get(search_files))
        .route("/:id/download", get(download_file))
        .route("/:id", put(update_file).delete(delete_file));

    let share_routes = Router::new()
        .route("/", post(create_share).get(list_shares))
        // Token resolution is public: recipients are not users
        .route("/token/:token", get(resolve_share))
        .route("/:id", delete(revoke_share));

    let auth_routes = Router::new().route("/user", get(get_current_user));

    let api_routes = Router::new()
        .nest("/folders", folder_routes)
        .nest("/files", file_routes)
        .nest("/shares", share_routes)
        .nest("/auth", auth_routes);

    // Clone jwt_state for the middleware closure
    let jwt_state_for_middleware = jwt_state.clone();

    Router::new()
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(middleware::from_fn(move |req, next| {
                    let state = jwt_state_for_middleware.clone();
                    jwt_auth(state, req, next)
                })),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_health_router() {
        let _router = create_health_router();
        // Should not panic
    }
}
