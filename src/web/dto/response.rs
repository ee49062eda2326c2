//! Response DTOs for the Web API.

use serde::Serialize;

use crate::db::User;
use crate::file::FileRecord;
use crate::share::ShareLink;

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Convert a stored `datetime('now')` timestamp to RFC 3339.
///
/// SQLite stores "YYYY-MM-DD HH:MM:SS" in UTC; clients get the same
/// instant with a T separator and Z suffix. Unparseable values pass
/// through unchanged.
pub fn to_rfc3339(timestamp: &str) -> String {
    match chrono::NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%d %H:%M:%S") {
        Ok(dt) => format!("{}Z", dt.format("%Y-%m-%dT%H:%M:%S")),
        Err(_) => timestamp.to_string(),
    }
}

/// Current user response.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            profile_image_url: user.profile_image_url,
            created_at: to_rfc3339(&user.created_at),
        }
    }
}

/// Folder response.
#[derive(Debug, Serialize)]
pub struct FolderResponse {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<crate::file::Folder> for FolderResponse {
    fn from(folder: crate::file::Folder) -> Self {
        Self {
            id: folder.id,
            name: folder.name,
            parent_id: folder.parent_id,
            created_at: to_rfc3339(&folder.created_at),
            updated_at: to_rfc3339(&folder.updated_at),
        }
    }
}

/// File response.
///
/// `name` is the user-facing filename; the storage key is internal and
/// not exposed.
#[derive(Debug, Serialize)]
pub struct FileResponse {
    pub id: i64,
    pub name: String,
    pub mime_type: String,
    /// Broad classification ("image", "document", ...).
    pub kind: &'static str,
    /// Size in bytes, as a decimal string.
    pub size: String,
    pub folder_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<FileRecord> for FileResponse {
    fn from(file: FileRecord) -> Self {
        let kind = file.kind().as_str();
        Self {
            id: file.id,
            name: file.original_name,
            mime_type: file.mime_type,
            kind,
            size: file.size,
            folder_id: file.folder_id,
            checksum: file.checksum,
            created_at: to_rfc3339(&file.created_at),
            updated_at: to_rfc3339(&file.updated_at),
        }
    }
}

/// Share link response.
#[derive(Debug, Serialize)]
pub struct ShareResponse {
    pub id: i64,
    pub file_id: i64,
    pub share_token: String,
    pub access_level: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    pub is_active: bool,
    pub created_at: String,
}

impl From<ShareLink> for ShareResponse {
    fn from(share: ShareLink) -> Self {
        Self {
            id: share.id,
            file_id: share.file_id,
            share_token: share.share_token,
            access_level: share.access_level.as_str(),
            expires_at: share.expires_at.map(|dt| dt.to_rfc3339()),
            is_active: share.is_active,
            created_at: to_rfc3339(&share.created_at),
        }
    }
}

/// Resolved share link: the link plus the file it points at.
#[derive(Debug, Serialize)]
pub struct SharedFileResponse {
    pub share: ShareResponse,
    pub file: FileResponse,
}
