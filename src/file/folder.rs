//! Folder hierarchy for Nimbus.
//!
//! Folders form a forest per user: `parent_id` is a self-reference and
//! NULL means the folder sits at the root. Moves are validated against
//! the ancestor chain so the hierarchy stays acyclic.

use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::file::validate_name;
use crate::{NimbusError, Result};

/// Upper bound on ancestor-walk depth. A chain longer than this means
/// the hierarchy is already corrupt, so the walk bails out.
const MAX_FOLDER_DEPTH: usize = 128;

/// A folder owned by a user.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Folder {
    /// Unique folder id.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Parent folder, or None for root-level folders.
    pub parent_id: Option<i64>,
    /// Owning user.
    pub user_id: String,
    /// Creation timestamp.
    pub created_at: String,
    /// Last modification timestamp.
    pub updated_at: String,
}

/// Data for creating a new folder.
#[derive(Debug, Clone)]
pub struct NewFolder {
    /// Display name.
    pub name: String,
    /// Parent folder, or None for root.
    pub parent_id: Option<i64>,
    /// Owning user.
    pub user_id: String,
}

impl NewFolder {
    /// Create a new root-level folder for a user.
    pub fn new(name: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent_id: None,
            user_id: user_id.into(),
        }
    }

    /// Place the folder under a parent.
    pub fn with_parent(mut self, parent_id: i64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}

/// Fields that can be updated on a folder.
///
/// `parent_id` is doubly optional: `None` leaves the parent untouched,
/// `Some(None)` moves the folder to the root.
#[derive(Debug, Clone, Default)]
pub struct FolderUpdate {
    pub name: Option<String>,
    pub parent_id: Option<Option<i64>>,
}

impl FolderUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rename the folder.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Move the folder under a new parent (None moves it to the root).
    pub fn with_parent(mut self, parent_id: Option<i64>) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    fn is_empty(&self) -> bool {
        self.name.is_none() && self.parent_id.is_none()
    }
}

/// Repository for folder operations.
pub struct FolderRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FolderRepository<'a> {
    /// Create a new FolderRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a folder.
    pub async fn create(&self, folder: &NewFolder) -> Result<Folder> {
        validate_name(&folder.name)?;

        if let Some(parent_id) = folder.parent_id {
            let parent = self
                .get_by_id(parent_id)
                .await?
                .ok_or_else(|| NimbusError::NotFound("parent folder".to_string()))?;
            if parent.user_id != folder.user_id {
                return Err(NimbusError::NotFound("parent folder".to_string()));
            }
        }

        let id = sqlx::query(
            "INSERT INTO folders (name, parent_id, user_id) VALUES (?, ?, ?)",
        )
        .bind(&folder.name)
        .bind(folder.parent_id)
        .bind(&folder.user_id)
        .execute(self.pool)
        .await
        .map_err(|e| NimbusError::Database(e.to_string()))?
        .last_insert_rowid();

        self.get_by_id(id)
            .await?
            .ok_or_else(|| NimbusError::NotFound("folder".to_string()))
    }

    /// Get a folder by id.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Folder>> {
        let folder = sqlx::query_as::<_, Folder>(
            "SELECT id, name, parent_id, user_id, created_at, updated_at
             FROM folders WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| NimbusError::Database(e.to_string()))?;

        Ok(folder)
    }

    /// Get a folder by id, scoped to its owner.
    pub async fn get_owned(&self, id: i64, user_id: &str) -> Result<Option<Folder>> {
        let folder = sqlx::query_as::<_, Folder>(
            "SELECT id, name, parent_id, user_id, created_at, updated_at
             FROM folders WHERE id = ? AND user_id = ?",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| NimbusError::Database(e.to_string()))?;

        Ok(folder)
    }

    /// List a user's folders directly under the given parent.
    ///
    /// `parent_id` of None lists the root level. Results are sorted by
    /// name for stable browsing.
    pub async fn list_by_owner(
        &self,
        user_id: &str,
        parent_id: Option<i64>,
    ) -> Result<Vec<Folder>> {
        let folders = match parent_id {
            Some(parent_id) => {
                sqlx::query_as::<_, Folder>(
                    "SELECT id, name, parent_id, user_id, created_at, updated_at
                     FROM folders WHERE user_id = ? AND parent_id = ?
                     ORDER BY name ASC",
                )
                .bind(user_id)
                .bind(parent_id)
                .fetch_all(self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, Folder>(
                    "SELECT id, name, parent_id, user_id, created_at, updated_at
                     FROM folders WHERE user_id = ? AND parent_id IS NULL
                     ORDER BY name ASC",
                )
                .bind(user_id)
                .fetch_all(self.pool)
                .await
            }
        }
        .map_err(|e| NimbusError::Database(e.to_string()))?;

        Ok(folders)
    }

    /// Update a folder's name and/or parent.
    ///
    /// Moves are rejected when the new parent is the folder itself or one
    /// of its descendants, which would detach the subtree into a cycle.
    pub async fn update(&self, id: i64, update: &FolderUpdate) -> Result<Folder> {
        if update.is_empty() {
            return self
                .get_by_id(id)
                .await?
                .ok_or_else(|| NimbusError::NotFound("folder".to_string()));
        }

        if let Some(name) = &update.name {
            validate_name(name)?;
        }

        if let Some(Some(new_parent)) = update.parent_id {
            if new_parent == id {
                return Err(NimbusError::Validation(
                    "folder cannot be its own parent".to_string(),
                ));
            }
            if self.is_descendant(new_parent, id).await? {
                return Err(NimbusError::Validation(
                    "folder cannot be moved into its own subtree".to_string(),
                ));
            }
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE folders SET ");
        let mut fields = qb.separated(", ");

        if let Some(name) = &update.name {
            fields.push("name = ").push_bind_unseparated(name);
        }
        if let Some(parent_id) = &update.parent_id {
            fields
                .push("parent_id = ")
                .push_bind_unseparated(*parent_id);
        }
        fields.push("updated_at = datetime('now')");

        qb.push(" WHERE id = ").push_bind(id);

        let result = qb
            .build()
            .execute(self.pool)
            .await
            .map_err(|e| NimbusError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(NimbusError::NotFound("folder".to_string()));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| NimbusError::NotFound("folder".to_string()))
    }

    /// Delete a folder.
    ///
    /// Children and contained files are re-parented to the root by the
    /// `ON DELETE SET NULL` constraints. Returns `true` if a row was
    /// deleted.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM folders WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| NimbusError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Check whether `candidate` lies in the subtree rooted at `ancestor`.
    ///
    /// Walks the parent chain upward from `candidate`.
    async fn is_descendant(&self, candidate: i64, ancestor: i64) -> Result<bool> {
        let mut current = Some(candidate);
        let mut depth = 0;

        while let Some(id) = current {
            if id == ancestor {
                return Ok(true);
            }
            depth += 1;
            if depth > MAX_FOLDER_DEPTH {
                return Err(NimbusError::StorageInconsistency(format!(
                    "folder {candidate} has an ancestor chain deeper than {MAX_FOLDER_DEPTH}"
                )));
            }

            current = sqlx::query_scalar::<_, Option<i64>>(
                "SELECT parent_id FROM folders WHERE id = ?",
            )
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| NimbusError::Database(e.to_string()))?
            .flatten();
        }

        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, UpsertUser, UserRepository};

    async fn setup_db() -> Database {
        let db = Database::open_in_memory().await.unwrap();
        UserRepository::new(db.pool())
            .upsert(&UpsertUser::new("u1"))
            .await
            .unwrap();
        db
    }

    #[tokio::test]
    async fn test_create_root_folder() {
        let db = setup_db().await;
        let repo = FolderRepository::new(db.pool());

        let folder = repo
            .create(&NewFolder::new("Documents", "u1"))
            .await
            .unwrap();

        assert_eq!(folder.name, "Documents");
        assert_eq!(folder.parent_id, None);
        assert_eq!(folder.user_id, "u1");
    }

    #[tokio::test]
    async fn test_create_nested_folder() {
        let db = setup_db().await;
        let repo = FolderRepository::new(db.pool());

        let parent = repo
            .create(&NewFolder::new("Documents", "u1"))
            .await
            .unwrap();
        let child = repo
            .create(&NewFolder::new("Taxes", "u1").with_parent(parent.id))
            .await
            .unwrap();

        assert_eq!(child.parent_id, Some(parent.id));
    }

    #[tokio::test]
    async fn test_create_rejects_empty_name() {
        let db = setup_db().await;
        let repo = FolderRepository::new(db.pool());

        let result = repo.create(&NewFolder::new("   ", "u1")).await;
        assert!(matches!(result, Err(NimbusError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_missing_parent() {
        let db = setup_db().await;
        let repo = FolderRepository::new(db.pool());

        let result = repo
            .create(&NewFolder::new("Orphan", "u1").with_parent(999))
            .await;
        assert!(matches!(result, Err(NimbusError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_foreign_parent() {
        let db = setup_db().await;
        UserRepository::new(db.pool())
            .upsert(&UpsertUser::new("u2"))
            .await
            .unwrap();
        let repo = FolderRepository::new(db.pool());

        let other = repo.create(&NewFolder::new("Theirs", "u2")).await.unwrap();

        let result = repo
            .create(&NewFolder::new("Mine", "u1").with_parent(other.id))
            .await;
        assert!(matches!(result, Err(NimbusError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_by_owner_root_and_nested() {
        let db = setup_db().await;
        let repo = FolderRepository::new(db.pool());

        let docs = repo
            .create(&NewFolder::new("Documents", "u1"))
            .await
            .unwrap();
        repo.create(&NewFolder::new("Archive", "u1")).await.unwrap();
        repo.create(&NewFolder::new("Taxes", "u1").with_parent(docs.id))
            .await
            .unwrap();

        let root = repo.list_by_owner("u1", None).await.unwrap();
        assert_eq!(root.len(), 2);
        // Sorted by name
        assert_eq!(root[0].name, "Archive");
        assert_eq!(root[1].name, "Documents");

        let nested = repo.list_by_owner("u1", Some(docs.id)).await.unwrap();
        assert_eq!(nested.len(), 1);
        assert_eq!(nested[0].name, "Taxes");
    }

    #[tokio::test]
    async fn test_list_is_scoped_to_owner() {
        let db = setup_db().await;
        UserRepository::new(db.pool())
            .upsert(&UpsertUser::new("u2"))
            .await
            .unwrap();
        let repo = FolderRepository::new(db.pool());

        repo.create(&NewFolder::new("Mine", "u1")).await.unwrap();
        repo.create(&NewFolder::new("Theirs", "u2")).await.unwrap();

        let folders = repo.list_by_owner("u1", None).await.unwrap();
        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].name, "Mine");
    }

    #[tokio::test]
    async fn test_rename() {
        let db = setup_db().await;
        let repo = FolderRepository::new(db.pool());

        let folder = repo.create(&NewFolder::new("Old", "u1")).await.unwrap();
        let updated = repo
            .update(folder.id, &FolderUpdate::new().with_name("New"))
            .await
            .unwrap();

        assert_eq!(updated.name, "New");
    }

    #[tokio::test]
    async fn test_move_to_root() {
        let db = setup_db().await;
        let repo = FolderRepository::new(db.pool());

        let parent = repo.create(&NewFolder::new("Parent", "u1")).await.unwrap();
        let child = repo
            .create(&NewFolder::new("Child", "u1").with_parent(parent.id))
            .await
            .unwrap();

        let moved = repo
            .update(child.id, &FolderUpdate::new().with_parent(None))
            .await
            .unwrap();

        assert_eq!(moved.parent_id, None);
    }

    #[tokio::test]
    async fn test_move_rejects_self_parent() {
        let db = setup_db().await;
        let repo = FolderRepository::new(db.pool());

        let folder = repo.create(&NewFolder::new("Loop", "u1")).await.unwrap();

        let result = repo
            .update(folder.id, &FolderUpdate::new().with_parent(Some(folder.id)))
            .await;
        assert!(matches!(result, Err(NimbusError::Validation(_))));
    }

    #[tokio::test]
    async fn test_move_rejects_cycle() {
        let db = setup_db().await;
        let repo = FolderRepository::new(db.pool());

        let a = repo.create(&NewFolder::new("A", "u1")).await.unwrap();
        let b = repo
            .create(&NewFolder::new("B", "u1").with_parent(a.id))
            .await
            .unwrap();
        let c = repo
            .create(&NewFolder::new("C", "u1").with_parent(b.id))
            .await
            .unwrap();

        // Moving A under its grandchild C would create a cycle
        let result = repo
            .update(a.id, &FolderUpdate::new().with_parent(Some(c.id)))
            .await;
        assert!(matches!(result, Err(NimbusError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_missing_folder() {
        let db = setup_db().await;
        let repo = FolderRepository::new(db.pool());

        let result = repo
            .update(999, &FolderUpdate::new().with_name("Ghost"))
            .await;
        assert!(matches!(result, Err(NimbusError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_reparents_children_to_root() {
        let db = setup_db().await;
        let repo = FolderRepository::new(db.pool());

        let parent = repo.create(&NewFolder::new("Parent", "u1")).await.unwrap();
        let child = repo
            .create(&NewFolder::new("Child", "u1").with_parent(parent.id))
            .await
            .unwrap();

        assert!(repo.delete(parent.id).await.unwrap());

        let child = repo.get_by_id(child.id).await.unwrap().unwrap();
        assert_eq!(child.parent_id, None);
    }

    #[tokio::test]
    async fn test_delete_missing_returns_false() {
        let db = setup_db().await;
        let repo = FolderRepository::new(db.pool());

        assert!(!repo.delete(999).await.unwrap());
    }
}
