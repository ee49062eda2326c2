//! Object storage for Nimbus.
//!
//! This module provides physical file storage functionality:
//! - Timestamp + random-suffix key naming (collision-safe without lookups)
//! - Flat, key-addressed layout
//! - Save, load, delete, and orphan sweep operations

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rand::Rng;
use sha2::{Digest, Sha256};

use crate::{NimbusError, Result};

/// Object store over a local directory.
///
/// Blobs are stored flat, keyed by a generated name:
/// ```text
/// {base_path}/
/// ├── 1724661000123-482911047.pdf
/// ├── 1724661000157-90331185.png
/// └── ...
/// ```
///
/// Keys combine a millisecond timestamp with a random component, so the
/// collision probability is negligible without a uniqueness lookup.
#[derive(Debug, Clone)]
pub struct FileStorage {
    /// Base directory for object storage.
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a new FileStorage with the given base path.
    ///
    /// The base directory will be created if it doesn't exist.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path)?;

        Ok(Self { base_path })
    }

    /// Get the base path of this storage.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Save content to storage under a newly generated key.
    ///
    /// Returns the storage key (`{millis}-{random}{.ext}`).
    pub fn save(&self, content: &[u8], original_name: &str) -> Result<String> {
        let key = Self::generate_key(original_name);
        self.save_with_key(content, &key)?;
        Ok(key)
    }

    /// Save content under a specific key.
    ///
    /// Useful when the key already exists in metadata (e.g. re-import).
    pub fn save_with_key(&self, content: &[u8], key: &str) -> Result<()> {
        let file_path = self.object_path(key);
        fs::write(&file_path, content)?;
        Ok(())
    }

    /// Load content from storage.
    pub fn load(&self, key: &str) -> Result<Vec<u8>> {
        let file_path = self.object_path(key);

        match fs::read(&file_path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(NimbusError::NotFound(format!("object {key}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete an object from storage.
    ///
    /// Returns `true` if the object was deleted, `false` if it didn't exist.
    /// Absence is not an error: deletes must be idempotent.
    pub fn delete(&self, key: &str) -> Result<bool> {
        let file_path = self.object_path(key);

        match fs::remove_file(&file_path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Check if an object exists in storage.
    pub fn exists(&self, key: &str) -> bool {
        self.object_path(key).exists()
    }

    /// Get the size of a stored object.
    pub fn object_size(&self, key: &str) -> Result<u64> {
        let file_path = self.object_path(key);

        match fs::metadata(&file_path) {
            Ok(m) => Ok(m.len()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(NimbusError::NotFound(format!("object {key}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Get the full on-disk path for a storage key.
    pub fn object_path(&self, key: &str) -> PathBuf {
        self.base_path.join(key)
    }

    /// Remove objects whose keys are not in the live set.
    ///
    /// A crash between the object write and the metadata insert (or between
    /// object delete and metadata delete) leaves objects no row references.
    /// Running this sweep with the set of keys known to metadata reclaims
    /// them.
    ///
    /// Uploads write the object before the metadata row, so an object can
    /// briefly look orphaned while its row is still on the way. Objects
    /// whose key timestamp is younger than `grace_millis` are kept, as is
    /// anything whose name we did not generate. Returns the number of
    /// objects removed.
    pub fn sweep_orphans(&self, live_keys: &HashSet<String>, grace_millis: i64) -> Result<usize> {
        let now = chrono::Utc::now().timestamp_millis();
        let mut removed = 0;

        for entry in fs::read_dir(&self.base_path)? {
            let entry = entry?;
            if !entry.path().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if live_keys.contains(&name) {
                continue;
            }
            match Self::key_timestamp_millis(&name) {
                Some(written) if now - written >= grace_millis => {
                    if fs::remove_file(entry.path()).is_ok() {
                        tracing::info!(key = %name, "Removed orphaned object");
                        removed += 1;
                    }
                }
                _ => {}
            }
        }

        Ok(removed)
    }

    /// The millisecond timestamp a generated key was created at, parsed
    /// from its leading component. None for names we did not generate.
    fn key_timestamp_millis(key: &str) -> Option<i64> {
        key.split('-').next()?.parse().ok()
    }

    /// Generate a new storage key for the given original filename.
    ///
    /// The key is `{millis}-{random}` suffixed with the original extension
    /// (if any), e.g. `1724661000123-482911047.pdf`.
    pub fn generate_key(original_name: &str) -> String {
        let millis = chrono::Utc::now().timestamp_millis();
        let random: u32 = rand::rng().random_range(0..1_000_000_000);

        match Self::extract_extension(original_name) {
            Some(ext) => format!("{millis}-{random}.{ext}"),
            None => format!("{millis}-{random}"),
        }
    }

    /// Extract the file extension from a filename, if any.
    fn extract_extension(filename: &str) -> Option<&str> {
        Path::new(filename).extension().and_then(|s| s.to_str())
    }
}

/// Compute the lowercase hex SHA-256 digest of the given content.
pub fn sha256_hex(content: &[u8]) -> String {
    format!("{:x}", Sha256::digest(content))
}
