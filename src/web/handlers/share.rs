//! Share link handlers for the Web API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::share::{AccessLevel, ShareService};
use crate::web::dto::{ApiResponse, CreateShareRequest, ShareResponse, SharedFileResponse};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;

/// POST /api/shares - Create a share link for an owned file.
pub async fn create_share(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Json(req): Json<CreateShareRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ShareResponse>>), ApiError> {
    req.validate().map_err(ApiError::from_validation_errors)?;

    let access_level = match &req.access_level {
        Some(s) => s
            .parse::<AccessLevel>()
            .map_err(|e| ApiError::unprocessable(e.to_string()))?,
        None => AccessLevel::default(),
    };

    let service = ShareService::new(state.db.pool());
    let share = service
        .create(&claims.sub, req.file_id, access_level, req.expires_at)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::new(share.into()))))
}

/// GET /api/shares/token/:token - Resolve a share token (no auth).
///
/// Unknown and revoked tokens return 404; expired links return 410 so
/// recipients can tell a dead link from a wrong one.
pub async fn resolve_share(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<ApiResponse<SharedFileResponse>>, ApiError> {
    let service = ShareService::new(state.db.pool());
    let (share, file) = service.resolve(&token).await?;

    Ok(Json(ApiResponse::new(SharedFileResponse {
        share: share.into(),
        file: file.into(),
    })))
}

/// GET /api/shares - List the caller's share links with their files.
///
/// Revoked and expired links are included so the owner can manage them.
pub async fn list_shares(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ApiResponse<Vec<SharedFileResponse>>>, ApiError> {
    let service = ShareService::new(state.db.pool());
    let shares = service.list_for_owner(&claims.sub).await.map_err(|e| {
        tracing::error!("Failed to list shares: {}", e);
        ApiError::internal("Failed to list shares")
    })?;

    let responses = shares
        .into_iter()
        .map(|(share, file)| SharedFileResponse {
            share: share.into(),
            file: file.into(),
        })
        .collect();
    Ok(Json(ApiResponse::new(responses)))
}

/// DELETE /api/shares/:id - Revoke a share link.
pub async fn revoke_share(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(share_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let service = ShareService::new(state.db.pool());
    service.revoke(share_id, &claims.sub).await?;

    Ok(StatusCode::NO_CONTENT)
}
