//! User handlers for the Web API.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::db::UserRepository;
use crate::web::dto::{ApiResponse, UserResponse};
use crate::web::error::ApiError;
use crate::web::handlers::{upsert_from_claims, AppState};
use crate::web::middleware::AuthUser;

/// GET /api/auth/user - Current user from the verified token.
///
/// Mirrors the claims into the local users table on every call, so the
/// row tracks profile changes made at the identity provider.
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let user_repo = UserRepository::new(state.db.pool());
    let user = user_repo.upsert(&upsert_from_claims(&claims)).await.map_err(|e| {
        tracing::error!("Failed to upsert user: {}", e);
        ApiError::internal("Failed to load user")
    })?;

    Ok(Json(ApiResponse::new(user.into())))
}
