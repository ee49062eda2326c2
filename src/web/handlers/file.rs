//! File handlers for the Web API.

use axum::{
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::file::{FileRepository, FileService, FileUpdate, FolderRepository, UploadItem};
use crate::web::dto::{ApiResponse, FileResponse, ListQuery, SearchQuery, UpdateFileRequest};
use crate::web::error::ApiError;
use crate::web::handlers::{ensure_user, AppState};
use crate::web::middleware::AuthUser;

/// Generate a safe Content-Disposition header value for file downloads.
///
/// This function sanitizes the filename to prevent header injection attacks
/// and uses RFC 5987 encoding for non-ASCII filenames.
///
/// # Security
///
/// The function:
/// - Removes control characters (including CR, LF which could cause header injection)
/// - Escapes double quotes and backslashes
/// - Uses RFC 5987 filename* parameter for proper Unicode support
fn content_disposition_header(filename: &str) -> String {
    // Sanitize filename for the basic filename parameter (ASCII fallback)
    let sanitized: String = filename
        .chars()
        .filter(|c| !c.is_control()) // Remove control characters (CR, LF, etc.)
        .map(|c| match c {
            '"' => '_',  // Replace double quotes
            '\\' => '_', // Replace backslashes
            _ => c,
        })
        .collect();

    // For ASCII-only filenames, use simple format
    if filename.is_ascii() && !filename.chars().any(|c| c.is_control() || c == '"' || c == '\\') {
        return format!("attachment; filename=\"{}\"", filename);
    }

    // Use RFC 5987 encoding for non-ASCII or special characters
    // filename* parameter with UTF-8 encoding
    let encoded = urlencoding::encode(filename);

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        sanitized, encoded
    )
}

/// POST /api/files/upload - Upload a batch of files.
///
/// Multipart form: any number of file parts named `files`, plus an
/// optional `folder_id` text part. The batch is all-or-nothing.
pub async fn upload_files(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<Vec<FileResponse>>>), ApiError> {
    ensure_user(&state, &claims).await?;

    let mut folder_id: Option<i64> = None;
    let mut items: Vec<UploadItem> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart request: {e}")))?
    {
        match field.name() {
            Some("folder_id") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Invalid folder_id: {e}")))?;
                if !text.is_empty() {
                    folder_id = Some(
                        text.parse()
                            .map_err(|_| ApiError::bad_request("Invalid folder_id"))?,
                    );
                }
            }
            Some("files") => {
                let original_name = field
                    .file_name()
                    .map(|s| s.to_string())
                    .ok_or_else(|| ApiError::bad_request("File part is missing a filename"))?;
                let mime_type = field.content_type().map(|s| s.to_string());
                let content = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {e}")))?;

                let mut item = UploadItem::new(original_name, content.to_vec());
                if let Some(mime_type) = mime_type {
                    item = item.with_mime_type(mime_type);
                }
                items.push(item);
            }
            _ => {
                // Unknown parts are ignored
            }
        }
    }

    let service = FileService::new(state.db.pool(), &state.storage, state.max_file_size);
    let records = service.upload_batch(&claims.sub, folder_id, &items).await?;

    let responses = records.into_iter().map(FileResponse::from).collect();
    Ok((StatusCode::CREATED, Json(ApiResponse::new(responses))))
}

/// GET /api/files - List files at one level of the hierarchy.
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<FileResponse>>>, ApiError> {
    let file_repo = FileRepository::new(state.db.pool());
    let files = file_repo
        .list_by_owner(&claims.sub, query.folder_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list files: {}", e);
            ApiError::internal("Failed to list files")
        })?;

    let responses = files.into_iter().map(FileResponse::from).collect();
    Ok(Json(ApiResponse::new(responses)))
}

/// GET /api/files/search?q= - Search files by name.
pub async fn search_files(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<Vec<FileResponse>>>, ApiError> {
    if query.q.trim().is_empty() {
        return Err(ApiError::bad_request("Search query must not be empty"));
    }

    let file_repo = FileRepository::new(state.db.pool());
    let files = file_repo.search(&claims.sub, &query.q).await.map_err(|e| {
        tracing::error!("Failed to search files: {}", e);
        ApiError::internal("Failed to search files")
    })?;

    let responses = files.into_iter().map(FileResponse::from).collect();
    Ok(Json(ApiResponse::new(responses)))
}

/// GET /api/files/:id/download - Download a file's content.
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(file_id): Path<i64>,
) -> Result<Response, ApiError> {
    let service = FileService::new(state.db.pool(), &state.storage, state.max_file_size);
    let (record, content) = service.download(file_id, &claims.sub).await?;

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, &record.mime_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(&record.original_name),
        )
        .header(header::CONTENT_LENGTH, content.len())
        .body(Body::from(content))
        .map_err(|e| {
            tracing::error!("Failed to build download response: {}", e);
            ApiError::internal("Failed to build response")
        })?;

    Ok(response)
}

/// PUT /api/files/:id - Rename and/or move a file.
pub async fn update_file(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(file_id): Path<i64>,
    Json(req): Json<UpdateFileRequest>,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    req.validate().map_err(ApiError::from_validation_errors)?;

    let file_repo = FileRepository::new(state.db.pool());
    file_repo
        .get_owned(file_id, &claims.sub)
        .await?
        .ok_or_else(|| ApiError::not_found("File not found"))?;

    // A target folder must belong to the same user
    if let Some(Some(folder_id)) = req.folder_id {
        let folder_repo = FolderRepository::new(state.db.pool());
        folder_repo
            .get_owned(folder_id, &claims.sub)
            .await?
            .ok_or_else(|| ApiError::not_found("Folder not found"))?;
    }

    let mut update = FileUpdate::new();
    if let Some(name) = &req.name {
        update = update.with_original_name(name);
    }
    if let Some(folder_id) = req.folder_id {
        update = update.with_folder(folder_id);
    }

    let file = file_repo.update(file_id, &update).await?;

    Ok(Json(ApiResponse::new(file.into())))
}

/// DELETE /api/files/:id - Delete a file and its stored content.
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(file_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let service = FileService::new(state.db.pool(), &state.storage, state.max_file_size);
    service.delete(file_id, &claims.sub).await?;

    Ok(StatusCode::NO_CONTENT)
}
