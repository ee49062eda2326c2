//! Folder handlers for the Web API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::file::{FolderRepository, FolderUpdate, NewFolder};
use crate::web::dto::{
    ApiResponse, CreateFolderRequest, FolderListQuery, FolderResponse, UpdateFolderRequest,
};
use crate::web::error::ApiError;
use crate::web::handlers::{ensure_user, AppState};
use crate::web::middleware::AuthUser;

/// POST /api/folders - Create a folder.
pub async fn create_folder(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Json(req): Json<CreateFolderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<FolderResponse>>), ApiError> {
    req.validate().map_err(ApiError::from_validation_errors)?;
    ensure_user(&state, &claims).await?;

    let folder_repo = FolderRepository::new(state.db.pool());
    let mut new_folder = NewFolder::new(&req.name, &claims.sub);
    if let Some(parent_id) = req.parent_id {
        new_folder = new_folder.with_parent(parent_id);
    }

    let folder = folder_repo.create(&new_folder).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::new(folder.into()))))
}

/// GET /api/folders - List folders at one level of the hierarchy.
pub async fn list_folders(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Query(query): Query<FolderListQuery>,
) -> Result<Json<ApiResponse<Vec<FolderResponse>>>, ApiError> {
    let folder_repo = FolderRepository::new(state.db.pool());
    let folders = folder_repo
        .list_by_owner(&claims.sub, query.parent_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list folders: {}", e);
            ApiError::internal("Failed to list folders")
        })?;

    let responses = folders.into_iter().map(FolderResponse::from).collect();
    Ok(Json(ApiResponse::new(responses)))
}

/// PUT /api/folders/:id - Rename and/or move a folder.
pub async fn update_folder(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(folder_id): Path<i64>,
    Json(req): Json<UpdateFolderRequest>,
) -> Result<Json<ApiResponse<FolderResponse>>, ApiError> {
    req.validate().map_err(ApiError::from_validation_errors)?;

    let folder_repo = FolderRepository::new(state.db.pool());
    folder_repo
        .get_owned(folder_id, &claims.sub)
        .await?
        .ok_or_else(|| ApiError::not_found("Folder not found"))?;

    // A new parent must belong to the same user
    if let Some(Some(parent_id)) = req.parent_id {
        folder_repo
            .get_owned(parent_id, &claims.sub)
            .await?
            .ok_or_else(|| ApiError::not_found("Parent folder not found"))?;
    }

    let mut update = FolderUpdate::new();
    if let Some(name) = &req.name {
        update = update.with_name(name);
    }
    if let Some(parent_id) = req.parent_id {
        update = update.with_parent(parent_id);
    }

    let folder = folder_repo.update(folder_id, &update).await?;

    Ok(Json(ApiResponse::new(folder.into())))
}

/// DELETE /api/folders/:id - Delete a folder.
///
/// Contained files and subfolders are re-parented to the root.
pub async fn delete_folder(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(folder_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let folder_repo = FolderRepository::new(state.db.pool());
    folder_repo
        .get_owned(folder_id, &claims.sub)
        .await?
        .ok_or_else(|| ApiError::not_found("Folder not found"))?;

    folder_repo.delete(folder_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
