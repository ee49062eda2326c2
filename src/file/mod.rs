//! File management for Nimbus.
//!
//! Submodules:
//! - `storage`: key-addressed object store on local disk
//! - `folder`: user folder hierarchy
//! - `metadata`: file metadata records and search
//! - `service`: upload/download/delete orchestration and orphan sweep

pub mod folder;
pub mod metadata;
pub mod service;
pub mod storage;

pub use folder::{Folder, FolderRepository, FolderUpdate, NewFolder};
pub use metadata::{FileKind, FileRecord, FileRepository, FileUpdate, NewFileRecord};
pub use service::{FileService, UploadItem};
pub use storage::{sha256_hex, FileStorage};

/// Maximum number of files accepted in a single upload batch.
pub const MAX_FILES_PER_BATCH: usize = 1000;

/// Maximum length of a user-supplied file or folder name.
pub const MAX_NAME_LENGTH: usize = 255;

/// Validate a user-supplied file or folder name.
pub(crate) fn validate_name(name: &str) -> crate::Result<()> {
    if name.trim().is_empty() {
        return Err(crate::NimbusError::Validation(
            "name must not be empty".to_string(),
        ));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(crate::NimbusError::Validation(format!(
            "name exceeds {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}
