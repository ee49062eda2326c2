//! File metadata records for Nimbus.
//!
//! Each stored object has exactly one metadata row. `name` holds the
//! generated storage key; `original_name` is what the user uploaded and
//! what search and downloads use.

use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::file::validate_name;
use crate::{NimbusError, Result};

/// Broad file classification derived from the MIME type.
///
/// Used by clients to pick icons and preview behavior without
/// re-parsing MIME strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Image,
    Video,
    Audio,
    Pdf,
    Document,
    Other,
}

impl FileKind {
    /// Classify a MIME type string.
    pub fn from_mime(mime_type: &str) -> Self {
        let mime = mime_type.to_lowercase();

        if mime.starts_with("image/") {
            return Self::Image;
        }
        if mime.starts_with("video/") {
            return Self::Video;
        }
        if mime.starts_with("audio/") {
            return Self::Audio;
        }
        if mime == "application/pdf" {
            return Self::Pdf;
        }
        if mime.starts_with("text/")
            || mime.contains("word")
            || mime.contains("spreadsheet")
            || mime.contains("presentation")
            || mime == "application/rtf"
        {
            return Self::Document;
        }

        Self::Other
    }

    /// Stable lowercase name for serialization.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Pdf => "pdf",
            Self::Document => "document",
            Self::Other => "other",
        }
    }
}

/// A file metadata record.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FileRecord {
    /// Unique file id.
    pub id: i64,
    /// Generated storage key.
    pub name: String,
    /// Filename as uploaded by the user.
    pub original_name: String,
    /// MIME type reported at upload.
    pub mime_type: String,
    /// Size in bytes, as a decimal string.
    pub size: String,
    /// On-disk path of the stored object.
    pub path: String,
    /// Containing folder, or None for root.
    pub folder_id: Option<i64>,
    /// Owning user.
    pub user_id: String,
    /// Hex SHA-256 digest of the content, if computed.
    pub checksum: Option<String>,
    /// Storage backend identifier (currently always "local").
    pub storage_type: String,
    /// Upload timestamp.
    pub created_at: String,
    /// Last metadata change.
    pub updated_at: String,
}

impl FileRecord {
    /// Classification of this file's MIME type.
    pub fn kind(&self) -> FileKind {
        FileKind::from_mime(&self.mime_type)
    }
}

/// Data for inserting a new file record.
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    pub name: String,
    pub original_name: String,
    pub mime_type: String,
    pub size: u64,
    pub path: String,
    pub folder_id: Option<i64>,
    pub user_id: String,
    pub checksum: Option<String>,
}

impl NewFileRecord {
    pub fn new(
        name: impl Into<String>,
        original_name: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            original_name: original_name.into(),
            mime_type: "application/octet-stream".to_string(),
            size: 0,
            path: String::new(),
            folder_id: None,
            user_id: user_id.into(),
            checksum: None,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_folder(mut self, folder_id: Option<i64>) -> Self {
        self.folder_id = folder_id;
        self
    }

    pub fn with_checksum(mut self, checksum: impl Into<String>) -> Self {
        self.checksum = Some(checksum.into());
        self
    }
}

/// Fields that can be updated on a file record.
///
/// `folder_id` is doubly optional: `None` leaves it untouched,
/// `Some(None)` moves the file to the root.
#[derive(Debug, Clone, Default)]
pub struct FileUpdate {
    pub original_name: Option<String>,
    pub folder_id: Option<Option<i64>>,
}

impl FileUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rename the file (the stored object key is unaffected).
    pub fn with_original_name(mut self, name: impl Into<String>) -> Self {
        self.original_name = Some(name.into());
        self
    }

    /// Move the file into a folder (None moves it to the root).
    pub fn with_folder(mut self, folder_id: Option<i64>) -> Self {
        self.folder_id = Some(folder_id);
        self
    }

    fn is_empty(&self) -> bool {
        self.original_name.is_none() && self.folder_id.is_none()
    }
}

/// Repository for file metadata operations.
pub struct FileRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FileRepository<'a> {
    /// Create a new FileRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new file record.
    pub async fn create(&self, file: &NewFileRecord) -> Result<FileRecord> {
        validate_name(&file.original_name)?;

        let id = sqlx::query(
            "INSERT INTO files (name, original_name, mime_type, size, path, folder_id, user_id, checksum)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&file.name)
        .bind(&file.original_name)
        .bind(&file.mime_type)
        .bind(file.size.to_string())
        .bind(&file.path)
        .bind(file.folder_id)
        .bind(&file.user_id)
        .bind(&file.checksum)
        .execute(self.pool)
        .await
        .map_err(|e| NimbusError::Database(e.to_string()))?
        .last_insert_rowid();

        self.get_by_id(id)
            .await?
            .ok_or_else(|| NimbusError::NotFound("file".to_string()))
    }

    /// Get a file record by id.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<FileRecord>> {
        let file = sqlx::query_as::<_, FileRecord>("SELECT * FROM files WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| NimbusError::Database(e.to_string()))?;

        Ok(file)
    }

    /// Get a file record by id, scoped to its owner.
    pub async fn get_owned(&self, id: i64, user_id: &str) -> Result<Option<FileRecord>> {
        let file =
            sqlx::query_as::<_, FileRecord>("SELECT * FROM files WHERE id = ? AND user_id = ?")
                .bind(id)
                .bind(user_id)
                .fetch_optional(self.pool)
                .await
                .map_err(|e| NimbusError::Database(e.to_string()))?;

        Ok(file)
    }

    /// List a user's files directly in the given folder, newest first.
    ///
    /// `folder_id` of None lists root-level files. `id DESC` breaks ties
    /// between files uploaded in the same second.
    pub async fn list_by_owner(
        &self,
        user_id: &str,
        folder_id: Option<i64>,
    ) -> Result<Vec<FileRecord>> {
        let files = match folder_id {
            Some(folder_id) => {
                sqlx::query_as::<_, FileRecord>(
                    "SELECT * FROM files WHERE user_id = ? AND folder_id = ?
                     ORDER BY created_at DESC, id DESC",
                )
                .bind(user_id)
                .bind(folder_id)
                .fetch_all(self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, FileRecord>(
                    "SELECT * FROM files WHERE user_id = ? AND folder_id IS NULL
                     ORDER BY created_at DESC, id DESC",
                )
                .bind(user_id)
                .fetch_all(self.pool)
                .await
            }
        }
        .map_err(|e| NimbusError::Database(e.to_string()))?;

        Ok(files)
    }

    /// Search a user's files by original name, newest first.
    ///
    /// Case-insensitive substring match across all of the user's folders.
    pub async fn search(&self, user_id: &str, query: &str) -> Result<Vec<FileRecord>> {
        let pattern = format!("%{}%", escape_like(query));

        let files = sqlx::query_as::<_, FileRecord>(
            "SELECT * FROM files
             WHERE user_id = ? AND lower(original_name) LIKE lower(?) ESCAPE '\\'
             ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .bind(pattern)
        .fetch_all(self.pool)
        .await
        .map_err(|e| NimbusError::Database(e.to_string()))?;

        Ok(files)
    }

    /// Update a file's display name and/or folder.
    pub async fn update(&self, id: i64, update: &FileUpdate) -> Result<FileRecord> {
        if update.is_empty() {
            return self
                .get_by_id(id)
                .await?
                .ok_or_else(|| NimbusError::NotFound("file".to_string()));
        }

        if let Some(name) = &update.original_name {
            validate_name(name)?;
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE files SET ");
        let mut fields = qb.separated(", ");

        if let Some(name) = &update.original_name {
            fields.push("original_name = ").push_bind_unseparated(name);
        }
        if let Some(folder_id) = &update.folder_id {
            fields
                .push("folder_id = ")
                .push_bind_unseparated(*folder_id);
        }
        fields.push("updated_at = datetime('now')");

        qb.push(" WHERE id = ").push_bind(id);

        let result = qb
            .build()
            .execute(self.pool)
            .await
            .map_err(|e| NimbusError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(NimbusError::NotFound("file".to_string()));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| NimbusError::NotFound("file".to_string()))
    }

    /// Delete a file record. Returns `true` if a row was deleted.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM files WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| NimbusError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// All storage keys currently referenced by metadata.
    ///
    /// Used by the orphan sweep to decide which objects are live.
    pub async fn live_storage_keys(&self) -> Result<Vec<String>> {
        let keys = sqlx::query_scalar::<_, String>("SELECT name FROM files")
            .fetch_all(self.pool)
            .await
            .map_err(|e| NimbusError::Database(e.to_string()))?;

        Ok(keys)
    }
}

/// Escape LIKE metacharacters so user input matches literally.
fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
