//! Share link records for Nimbus.
//!
//! A share link grants unauthenticated access to one file through an
//! unguessable token. Links are soft-revoked: `is_active` flips to 0 and
//! the row stays for auditing, but token lookups no longer see it.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::{NimbusError, Result};

/// Access level granted by a share link.
///
/// Stored with the link and reported to clients; enforcement beyond
/// read access is up to the consuming application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessLevel {
    #[default]
    View,
    Edit,
    Comment,
}

impl AccessLevel {
    /// Stable lowercase name used in the database and API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Edit => "edit",
            Self::Comment => "comment",
        }
    }
}

impl std::str::FromStr for AccessLevel {
    type Err = NimbusError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "view" => Ok(Self::View),
            "edit" => Ok(Self::Edit),
            "comment" => Ok(Self::Comment),
            other => Err(NimbusError::Validation(format!(
                "unknown access level: {other}"
            ))),
        }
    }
}

impl TryFrom<String> for AccessLevel {
    type Error = NimbusError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl std::fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A share link row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ShareLink {
    /// Unique link id.
    pub id: i64,
    /// The shared file.
    pub file_id: i64,
    /// User who created the link.
    pub shared_by_user_id: String,
    /// Unguessable token carried in share URLs.
    pub share_token: String,
    /// Granted access level.
    #[sqlx(try_from = "String")]
    pub access_level: AccessLevel,
    /// Expiry instant, or None for links that never expire.
    pub expires_at: Option<DateTime<Utc>>,
    /// False once the link has been revoked.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: String,
}

impl ShareLink {
    /// Whether the link's expiry instant has passed.
    ///
    /// Expiry is evaluated against the given instant so callers and
    /// tests agree on "now".
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at <= now,
            None => false,
        }
    }
}

/// Data for creating a share link.
#[derive(Debug, Clone)]
pub struct NewShareLink {
    pub file_id: i64,
    pub shared_by_user_id: String,
    pub access_level: AccessLevel,
    pub expires_at: Option<DateTime<Utc>>,
}

impl NewShareLink {
    pub fn new(file_id: i64, shared_by_user_id: impl Into<String>) -> Self {
        Self {
            file_id,
            shared_by_user_id: shared_by_user_id.into(),
            access_level: AccessLevel::View,
            expires_at: None,
        }
    }

    pub fn with_access_level(mut self, access_level: AccessLevel) -> Self {
        self.access_level = access_level;
        self
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }
}

/// Repository for share link operations.
pub struct ShareRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ShareRepository<'a> {
    /// Create a new ShareRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a share link with the given token.
    pub async fn create(&self, share: &NewShareLink, token: &str) -> Result<ShareLink> {
        let id = sqlx::query(
            "INSERT INTO shared_files (file_id, shared_by_user_id, share_token, access_level, expires_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(share.file_id)
        .bind(&share.shared_by_user_id)
        .bind(token)
        .bind(share.access_level.as_str())
        .bind(share.expires_at)
        .execute(self.pool)
        .await
        .map_err(|e| NimbusError::Database(e.to_string()))?
        .last_insert_rowid();

        self.get_by_id(id)
            .await?
            .ok_or_else(|| NimbusError::NotFound("share link".to_string()))
    }

    /// Get a share link by id.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<ShareLink>> {
        let share =
            sqlx::query_as::<_, ShareLink>("SELECT * FROM shared_files WHERE id = ?")
                .bind(id)
                .fetch_optional(self.pool)
                .await
                .map_err(|e| NimbusError::Database(e.to_string()))?;

        Ok(share)
    }

    /// Look up an active share link by token.
    ///
    /// Revoked links are filtered out here, so to callers a revoked
    /// token is indistinguishable from one that never existed.
    pub async fn get_by_token(&self, token: &str) -> Result<Option<ShareLink>> {
        let share = sqlx::query_as::<_, ShareLink>(
            "SELECT * FROM shared_files WHERE share_token = ? AND is_active = 1",
        )
        .bind(token)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| NimbusError::Database(e.to_string()))?;

        Ok(share)
    }

    /// Whether any row (active or revoked) uses this token.
    pub async fn token_exists(&self, token: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM shared_files WHERE share_token = ?)",
        )
        .bind(token)
        .fetch_one(self.pool)
        .await
        .map_err(|e| NimbusError::Database(e.to_string()))?;

        Ok(exists)
    }

    /// List a user's share links, newest first.
    pub async fn list_by_owner(&self, user_id: &str) -> Result<Vec<ShareLink>> {
        let shares = sqlx::query_as::<_, ShareLink>(
            "SELECT * FROM shared_files WHERE shared_by_user_id = ?
             ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| NimbusError::Database(e.to_string()))?;

        Ok(shares)
    }

    /// Set a link's active flag. Returns `true` if a row was updated.
    pub async fn set_active(&self, id: i64, active: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE shared_files SET is_active = ? WHERE id = ?")
            .bind(active)
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| NimbusError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}
