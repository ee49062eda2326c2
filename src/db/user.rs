//! User model and repository for Nimbus.
//!
//! Users are provisioned by an external identity provider; this module only
//! mirrors the claims it hands us. Accounts are upserted on first sight and
//! never deleted here.

use sqlx::SqlitePool;

use crate::{NimbusError, Result};

/// A registered user.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Opaque identity-provider id.
    pub id: String,
    /// Email address.
    pub email: Option<String>,
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
    /// Avatar URL.
    pub profile_image_url: Option<String>,
    /// When the account was first seen.
    pub created_at: String,
    /// When the account was last refreshed from claims.
    pub updated_at: String,
}

/// Data for inserting or refreshing a user.
#[derive(Debug, Clone)]
pub struct UpsertUser {
    /// Opaque identity-provider id.
    pub id: String,
    /// Email address.
    pub email: Option<String>,
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
    /// Avatar URL.
    pub profile_image_url: Option<String>,
}

impl UpsertUser {
    /// Create a new UpsertUser with just an id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
            first_name: None,
            last_name: None,
            profile_image_url: None,
        }
    }

    /// Set the email address.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Set the name fields.
    pub fn with_name(
        mut self,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        self.first_name = Some(first_name.into());
        self.last_name = Some(last_name.into());
        self
    }

    /// Set the avatar URL.
    pub fn with_profile_image(mut self, url: impl Into<String>) -> Self {
        self.profile_image_url = Some(url.into());
        self
    }
}

/// Repository for user operations.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a user by id.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, first_name, last_name, profile_image_url, created_at, updated_at
             FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| NimbusError::Database(e.to_string()))?;

        Ok(user)
    }

    /// Insert a user, or overwrite the claim-derived fields on conflict.
    pub async fn upsert(&self, user: &UpsertUser) -> Result<User> {
        sqlx::query(
            "INSERT INTO users (id, email, first_name, last_name, profile_image_url)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 email = excluded.email,
                 first_name = excluded.first_name,
                 last_name = excluded.last_name,
                 profile_image_url = excluded.profile_image_url,
                 updated_at = datetime('now')",
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.profile_image_url)
        .execute(self.pool)
        .await
        .map_err(|e| NimbusError::Database(e.to_string()))?;

        self.get_by_id(&user.id)
            .await?
            .ok_or_else(|| NimbusError::NotFound("user".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    async fn setup_db() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn test_upsert_inserts_new_user() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        let user = repo
            .upsert(
                &UpsertUser::new("ext-123")
                    .with_email("alice@example.com")
                    .with_name("Alice", "Smith"),
            )
            .await
            .unwrap();

        assert_eq!(user.id, "ext-123");
        assert_eq!(user.email, Some("alice@example.com".to_string()));
        assert_eq!(user.first_name, Some("Alice".to_string()));
        assert_eq!(user.last_name, Some("Smith".to_string()));
    }

    #[tokio::test]
    async fn test_upsert_overwrites_on_conflict() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        repo.upsert(&UpsertUser::new("ext-123").with_email("old@example.com"))
            .await
            .unwrap();

        let user = repo
            .upsert(&UpsertUser::new("ext-123").with_email("new@example.com"))
            .await
            .unwrap();

        assert_eq!(user.email, Some("new@example.com".to_string()));
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        let found = repo.get_by_id("missing").await.unwrap();
        assert!(found.is_none());
    }
}
