//! File service for Nimbus.
//!
//! Coordinates the object store and the metadata tables so the two stay
//! consistent: uploads write the object first and roll back on metadata
//! failure, deletes remove the object before the row, and the orphan
//! sweep reclaims anything a crash left behind.

use std::collections::HashSet;

use sqlx::SqlitePool;
use tracing::{error, warn};

use crate::file::folder::FolderRepository;
use crate::file::metadata::{FileRecord, FileRepository, NewFileRecord};
use crate::file::storage::{sha256_hex, FileStorage};
use crate::file::{validate_name, MAX_FILES_PER_BATCH};
use crate::{NimbusError, Result};

/// Objects younger than this are never swept. Uploads write the object
/// before the metadata row, so a fresh object without a row may belong
/// to an upload that is still in flight.
const SWEEP_GRACE_MILLIS: i64 = 60 * 60 * 1000;

/// One file in an upload batch.
#[derive(Debug, Clone)]
pub struct UploadItem {
    /// Filename as provided by the client.
    pub original_name: String,
    /// MIME type reported by the client, if any.
    pub mime_type: Option<String>,
    /// File content.
    pub content: Vec<u8>,
}

impl UploadItem {
    pub fn new(original_name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            original_name: original_name.into(),
            mime_type: None,
            content,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

/// Service coordinating object storage and file metadata.
pub struct FileService<'a> {
    pool: &'a SqlitePool,
    storage: &'a FileStorage,
    /// Per-file size cap in bytes.
    max_file_size: u64,
}

impl<'a> FileService<'a> {
    pub fn new(pool: &'a SqlitePool, storage: &'a FileStorage, max_file_size: u64) -> Self {
        Self {
            pool,
            storage,
            max_file_size,
        }
    }

    /// Upload a batch of files into one folder, all-or-nothing.
    ///
    /// Validates the whole batch before writing anything; if any object
    /// write or metadata insert fails midway, already-persisted pieces of
    /// the batch are rolled back and the error is returned. Returns the
    /// created records in input order.
    pub async fn upload_batch(
        &self,
        user_id: &str,
        folder_id: Option<i64>,
        items: &[UploadItem],
    ) -> Result<Vec<FileRecord>> {
        if items.is_empty() {
            return Err(NimbusError::Validation(
                "at least one file is required".to_string(),
            ));
        }
        if items.len() > MAX_FILES_PER_BATCH {
            return Err(NimbusError::Validation(format!(
                "batch exceeds {MAX_FILES_PER_BATCH} files"
            )));
        }
        for item in items {
            validate_name(&item.original_name)?;
            if item.content.len() as u64 > self.max_file_size {
                return Err(NimbusError::Validation(format!(
                    "{} exceeds the maximum file size",
                    item.original_name
                )));
            }
        }

        if let Some(folder_id) = folder_id {
            let folders = FolderRepository::new(self.pool);
            folders
                .get_owned(folder_id, user_id)
                .await?
                .ok_or_else(|| NimbusError::NotFound("folder".to_string()))?;
        }

        let files = FileRepository::new(self.pool);
        let mut saved_keys: Vec<String> = Vec::with_capacity(items.len());
        let mut created: Vec<FileRecord> = Vec::with_capacity(items.len());

        for item in items {
            let result = self
                .store_one(&files, user_id, folder_id, item, &mut saved_keys)
                .await;

            match result {
                Ok(record) => created.push(record),
                Err(e) => {
                    self.rollback_batch(&files, &saved_keys, &created).await;
                    return Err(e);
                }
            }
        }

        Ok(created)
    }

    async fn store_one(
        &self,
        files: &FileRepository<'_>,
        user_id: &str,
        folder_id: Option<i64>,
        item: &UploadItem,
        saved_keys: &mut Vec<String>,
    ) -> Result<FileRecord> {
        let key = self.storage.save(&item.content, &item.original_name)?;
        saved_keys.push(key.clone());

        let mime_type = match &item.mime_type {
            Some(m) if !m.is_empty() => m.clone(),
            _ => mime_guess::from_path(&item.original_name)
                .first_or_octet_stream()
                .to_string(),
        };

        let path = self.storage.object_path(&key).to_string_lossy().into_owned();

        files
            .create(
                &NewFileRecord::new(&key, &item.original_name, user_id)
                    .with_mime_type(mime_type)
                    .with_size(item.content.len() as u64)
                    .with_path(path)
                    .with_folder(folder_id)
                    .with_checksum(sha256_hex(&item.content)),
            )
            .await
    }

    /// Undo a partially persisted batch: delete inserted rows, then the
    /// stored objects. Cleanup failures are logged, not propagated; the
    /// orphan sweep will catch anything left over.
    async fn rollback_batch(
        &self,
        files: &FileRepository<'_>,
        saved_keys: &[String],
        created: &[FileRecord],
    ) {
        for record in created {
            if let Err(e) = files.delete(record.id).await {
                warn!(file_id = record.id, "Batch rollback failed to delete row: {e}");
            }
        }
        for key in saved_keys {
            if let Err(e) = self.storage.delete(key) {
                warn!(key = %key, "Batch rollback failed to delete object: {e}");
            }
        }
    }

    /// Fetch a file's metadata and content for download.
    ///
    /// A metadata row whose object is missing from disk is reported as a
    /// storage inconsistency rather than a plain not-found, and logged. A
    /// checksum mismatch is logged but the content is still returned.
    pub async fn download(&self, id: i64, user_id: &str) -> Result<(FileRecord, Vec<u8>)> {
        let files = FileRepository::new(self.pool);
        let record = files
            .get_owned(id, user_id)
            .await?
            .ok_or_else(|| NimbusError::NotFound("file".to_string()))?;

        let content = match self.storage.load(&record.name) {
            Ok(content) => content,
            Err(NimbusError::NotFound(_)) => {
                error!(
                    file_id = record.id,
                    key = %record.name,
                    "Metadata references an object missing from storage"
                );
                return Err(NimbusError::StorageInconsistency(format!(
                    "object for file {} is missing",
                    record.id
                )));
            }
            Err(e) => return Err(e),
        };

        if let Some(expected) = &record.checksum {
            let actual = sha256_hex(&content);
            if &actual != expected {
                warn!(
                    file_id = record.id,
                    key = %record.name,
                    "Checksum mismatch on download"
                );
            }
        }

        Ok((record, content))
    }

    /// Delete a file: object first, then the metadata row.
    ///
    /// This order means a crash in between leaves a row pointing at a
    /// missing object, which downloads surface as an inconsistency and
    /// the row can still be deleted on retry. An already-missing object
    /// is tolerated.
    pub async fn delete(&self, id: i64, user_id: &str) -> Result<()> {
        let files = FileRepository::new(self.pool);
        let record = files
            .get_owned(id, user_id)
            .await?
            .ok_or_else(|| NimbusError::NotFound("file".to_string()))?;

        if !self.storage.delete(&record.name)? {
            warn!(
                file_id = record.id,
                key = %record.name,
                "Object already missing at delete"
            );
        }

        files.delete(record.id).await?;
        Ok(())
    }

    /// Remove stored objects no metadata row references.
    ///
    /// Objects written within the last hour are left alone so the sweep
    /// cannot race an upload whose row has not landed yet. Returns the
    /// number of objects reclaimed.
    pub async fn sweep_orphans(&self) -> Result<usize> {
        let files = FileRepository::new(self.pool);
        let live: HashSet<String> = files.live_storage_keys().await?.into_iter().collect();
        self.storage.sweep_orphans(&live, SWEEP_GRACE_MILLIS)
    }
}
