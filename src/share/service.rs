//! Share link service for Nimbus.
//!
//! Owns token generation and the link lifecycle. Resolution deliberately
//! distinguishes "expired" from "unknown" so clients can tell a dead
//! link from a mistyped one, while revoked links look exactly like
//! unknown ones.

use chrono::{DateTime, Utc};
use rand::RngCore;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::file::{FileRecord, FileRepository};
use crate::share::link::{AccessLevel, NewShareLink, ShareLink, ShareRepository};
use crate::{NimbusError, Result};

/// Token length in random bytes (hex-encoded to twice this many chars).
const TOKEN_BYTES: usize = 32;

/// Attempts before giving up on finding an unused token. With 256-bit
/// tokens a single collision is already implausible.
const TOKEN_RETRIES: usize = 5;

/// Service managing share links.
pub struct ShareService<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ShareService<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a share link for a file the user owns.
    ///
    /// A past `expires_at` is accepted; the link is simply born expired.
    pub async fn create(
        &self,
        user_id: &str,
        file_id: i64,
        access_level: AccessLevel,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<ShareLink> {
        let files = FileRepository::new(self.pool);
        files
            .get_owned(file_id, user_id)
            .await?
            .ok_or_else(|| NimbusError::NotFound("file".to_string()))?;

        let shares = ShareRepository::new(self.pool);
        let mut new_share = NewShareLink::new(file_id, user_id).with_access_level(access_level);
        if let Some(expires_at) = expires_at {
            new_share = new_share.with_expiry(expires_at);
        }

        for attempt in 0..TOKEN_RETRIES {
            let token = generate_token();
            if shares.token_exists(&token).await? {
                warn!(attempt, "Share token collision, regenerating");
                continue;
            }
            let share = shares.create(&new_share, &token).await?;
            info!(share_id = share.id, file_id, "Created share link");
            return Ok(share);
        }

        Err(NimbusError::Database(
            "could not generate a unique share token".to_string(),
        ))
    }

    /// Resolve a token to its link and file.
    ///
    /// Unknown and revoked tokens both come back as not-found; a token
    /// whose link has expired comes back as expired.
    pub async fn resolve(&self, token: &str) -> Result<(ShareLink, FileRecord)> {
        let shares = ShareRepository::new(self.pool);
        let share = shares
            .get_by_token(token)
            .await?
            .ok_or_else(|| NimbusError::NotFound("share link".to_string()))?;

        if share.is_expired_at(Utc::now()) {
            return Err(NimbusError::Expired("share link".to_string()));
        }

        let files = FileRepository::new(self.pool);
        let file = files
            .get_by_id(share.file_id)
            .await?
            .ok_or_else(|| NimbusError::NotFound("share link".to_string()))?;

        Ok((share, file))
    }

    /// Revoke a link the user created.
    ///
    /// Revocation is idempotent: revoking an already-revoked link
    /// succeeds. Links created by other users are reported as not found
    /// rather than forbidden.
    pub async fn revoke(&self, id: i64, user_id: &str) -> Result<()> {
        let shares = ShareRepository::new(self.pool);
        let share = shares
            .get_by_id(id)
            .await?
            .filter(|s| s.shared_by_user_id == user_id)
            .ok_or_else(|| NimbusError::NotFound("share link".to_string()))?;

        shares.set_active(share.id, false).await?;
        info!(share_id = share.id, "Revoked share link");
        Ok(())
    }

    /// List the user's share links with their files, newest first.
    ///
    /// Includes revoked and expired links: the owner needs to see dead
    /// links to manage them.
    pub async fn list_for_owner(&self, user_id: &str) -> Result<Vec<(ShareLink, FileRecord)>> {
        let shares = ShareRepository::new(self.pool).list_by_owner(user_id).await?;
        let files = FileRepository::new(self.pool);

        let mut out = Vec::with_capacity(shares.len());
        for share in shares {
            // The file row exists while the share does (cascade on delete)
            let file = files
                .get_by_id(share.file_id)
                .await?
                .ok_or_else(|| NimbusError::NotFound("file".to_string()))?;
            out.push((share, file));
        }
        Ok(out)
    }
}

/// Generate a 256-bit random token, hex-encoded.
fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, UpsertUser, UserRepository};
    use crate::file::NewFileRecord;
    use chrono::Duration;

    async fn setup() -> (Database, i64) {
        let db = Database::open_in_memory().await.unwrap();
        UserRepository::new(db.pool())
            .upsert(&UpsertUser::new("u1"))
            .await
            .unwrap();
        let file = FileRepository::new(db.pool())
            .create(
                &NewFileRecord::new("key-1", "doc.pdf", "u1")
                    .with_mime_type("application/pdf")
                    .with_size(10)
                    .with_path("/tmp/key-1"),
            )
            .await
            .unwrap();
        (db, file.id)
    }

    #[test]
    fn test_generate_token_shape() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));

        // Tokens are random
        assert_ne!(generate_token(), generate_token());
    }

    #[tokio::test]
    async fn test_create_and_resolve() {
        let (db, file_id) = setup().await;
        let service = ShareService::new(db.pool());

        let share = service
            .create("u1", file_id, AccessLevel::View, None)
            .await
            .unwrap();

        let (resolved, file) = service.resolve(&share.share_token).await.unwrap();
        assert_eq!(resolved.id, share.id);
        assert_eq!(file.id, file_id);
        assert_eq!(file.original_name, "doc.pdf");
    }

    #[tokio::test]
    async fn test_create_requires_file_ownership() {
        let (db, file_id) = setup().await;
        let service = ShareService::new(db.pool());

        let result = service
            .create("intruder", file_id, AccessLevel::View, None)
            .await;
        assert!(matches!(result, Err(NimbusError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_unknown_token_not_found() {
        let (db, _file_id) = setup().await;
        let service = ShareService::new(db.pool());

        let result = service.resolve("no-such-token").await;
        assert!(matches!(result, Err(NimbusError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_expired_link_distinguished_from_unknown() {
        let (db, file_id) = setup().await;
        let service = ShareService::new(db.pool());

        let share = service
            .create(
                "u1",
                file_id,
                AccessLevel::View,
                Some(Utc::now() - Duration::hours(1)),
            )
            .await
            .unwrap();

        let result = service.resolve(&share.share_token).await;
        assert!(matches!(result, Err(NimbusError::Expired(_))));
    }

    #[tokio::test]
    async fn test_future_expiry_still_resolves() {
        let (db, file_id) = setup().await;
        let service = ShareService::new(db.pool());

        let share = service
            .create(
                "u1",
                file_id,
                AccessLevel::View,
                Some(Utc::now() + Duration::hours(1)),
            )
            .await
            .unwrap();

        assert!(service.resolve(&share.share_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_revoked_link_looks_unknown() {
        let (db, file_id) = setup().await;
        let service = ShareService::new(db.pool());

        let share = service
            .create("u1", file_id, AccessLevel::View, None)
            .await
            .unwrap();

        service.revoke(share.id, "u1").await.unwrap();

        // Indistinguishable from a token that never existed
        let result = service.resolve(&share.share_token).await;
        assert!(matches!(result, Err(NimbusError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let (db, file_id) = setup().await;
        let service = ShareService::new(db.pool());

        let share = service
            .create("u1", file_id, AccessLevel::View, None)
            .await
            .unwrap();

        service.revoke(share.id, "u1").await.unwrap();
        service.revoke(share.id, "u1").await.unwrap();
    }

    #[tokio::test]
    async fn test_revoke_scoped_to_creator() {
        let (db, file_id) = setup().await;
        let service = ShareService::new(db.pool());

        let share = service
            .create("u1", file_id, AccessLevel::View, None)
            .await
            .unwrap();

        let result = service.revoke(share.id, "intruder").await;
        assert!(matches!(result, Err(NimbusError::NotFound(_))));

        // Still resolvable: the revoke did not go through
        assert!(service.resolve(&share.share_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_expired_link_can_still_be_revoked() {
        let (db, file_id) = setup().await;
        let service = ShareService::new(db.pool());

        let share = service
            .create(
                "u1",
                file_id,
                AccessLevel::View,
                Some(Utc::now() - Duration::hours(1)),
            )
            .await
            .unwrap();

        service.revoke(share.id, "u1").await.unwrap();

        // Revoked wins over expired on lookup
        let result = service.resolve(&share.share_token).await;
        assert!(matches!(result, Err(NimbusError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_for_owner() {
        let (db, file_id) = setup().await;
        let service = ShareService::new(db.pool());

        let a = service
            .create("u1", file_id, AccessLevel::View, None)
            .await
            .unwrap();
        let b = service
            .create("u1", file_id, AccessLevel::Edit, None)
            .await
            .unwrap();

        let shares = service.list_for_owner("u1").await.unwrap();
        assert_eq!(shares.len(), 2);
        assert_eq!(shares[0].0.id, b.id);
        assert_eq!(shares[1].0.id, a.id);
        assert_eq!(shares[0].1.original_name, "doc.pdf");

        // Revoked links stay visible to the owner
        service.revoke(a.id, "u1").await.unwrap();
        assert_eq!(service.list_for_owner("u1").await.unwrap().len(), 2);

        assert!(service.list_for_owner("u2").await.unwrap().is_empty());
    }
}
