//! Request DTOs for the Web API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use validator::Validate;

/// Deserialize a field that distinguishes "absent" from "explicitly null".
///
/// Absent fields fall back to the outer `None` via `#[serde(default)]`;
/// a present `null` becomes `Some(None)`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Folder creation request.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateFolderRequest {
    /// Folder name.
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,
    /// Parent folder (omit for root).
    #[serde(default)]
    pub parent_id: Option<i64>,
}

/// Folder update request.
///
/// `parent_id: null` moves the folder to the root; omitting the field
/// leaves the parent unchanged.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateFolderRequest {
    /// New folder name.
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,
    /// New parent folder.
    #[serde(default, deserialize_with = "double_option")]
    pub parent_id: Option<Option<i64>>,
}

/// File update request.
///
/// `folder_id: null` moves the file to the root; omitting the field
/// leaves it in place.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateFileRequest {
    /// New display name.
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,
    /// New containing folder.
    #[serde(default, deserialize_with = "double_option")]
    pub folder_id: Option<Option<i64>>,
}

/// Share link creation request.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateShareRequest {
    /// File to share.
    pub file_id: i64,
    /// Access level ("view", "edit" or "comment"); defaults to view.
    #[serde(default)]
    pub access_level: Option<String>,
    /// Expiry instant (RFC 3339); omit for a link that never expires.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Query parameters for listing folders.
#[derive(Debug, Default, Deserialize)]
pub struct FolderListQuery {
    /// Parent folder to list (omit for the root level).
    pub parent_id: Option<i64>,
}

/// Query parameters for listing files.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Folder to list (omit for the root level).
    pub folder_id: Option<i64>,
}

/// Query parameters for file search.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Search term, matched case-insensitively against file names.
    pub q: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_folder_validation() {
        let req = CreateFolderRequest {
            name: "Documents".to_string(),
            parent_id: None,
        };
        assert!(req.validate().is_ok());

        let req = CreateFolderRequest {
            name: String::new(),
            parent_id: None,
        };
        assert!(req.validate().is_err());

        let req = CreateFolderRequest {
            name: "x".repeat(256),
            parent_id: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_update_folder_double_option() {
        // Field absent: parent unchanged
        let req: UpdateFolderRequest = serde_json::from_str(r#"{"name": "New"}"#).unwrap();
        assert_eq!(req.parent_id, None);

        // Explicit null: move to root
        let req: UpdateFolderRequest = serde_json::from_str(r#"{"parent_id": null}"#).unwrap();
        assert_eq!(req.parent_id, Some(None));

        // Explicit value: move under that folder
        let req: UpdateFolderRequest = serde_json::from_str(r#"{"parent_id": 7}"#).unwrap();
        assert_eq!(req.parent_id, Some(Some(7)));
    }

    #[test]
    fn test_create_share_defaults() {
        let req: CreateShareRequest = serde_json::from_str(r#"{"file_id": 3}"#).unwrap();
        assert_eq!(req.file_id, 3);
        assert!(req.access_level.is_none());
        assert!(req.expires_at.is_none());
    }

    #[test]
    fn test_create_share_with_expiry() {
        let req: CreateShareRequest =
            serde_json::from_str(r#"{"file_id": 3, "expires_at": "2030-01-01T00:00:00Z"}"#)
                .unwrap();
        assert!(req.expires_at.is_some());
    }
}
