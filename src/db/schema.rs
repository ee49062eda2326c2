//! Database schema and migrations for Nimbus.
//!
//! This module contains all database migrations that will be applied
//! sequentially when the database is first opened or upgraded.

/// Database migrations.
///
/// Each migration is a SQL script that will be executed in order.
/// The schema_version table tracks which migrations have been applied.
pub const MIGRATIONS: &[&str] = &[
    // v1: Initial schema - users, folders, files, shared_files
    r#"
-- Users table. Identity is issued by an external provider, so the id is
-- an opaque string rather than an autoincrement integer.
CREATE TABLE users (
    id                  TEXT PRIMARY KEY,
    email               TEXT UNIQUE,
    first_name          TEXT,
    last_name           TEXT,
    profile_image_url   TEXT,
    created_at          TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at          TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Folders table. parent_id is a self-reference; NULL means root.
CREATE TABLE folders (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    parent_id   INTEGER REFERENCES folders(id) ON DELETE SET NULL,
    user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at  TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_folders_user_id ON folders(user_id);
CREATE INDEX idx_folders_parent_id ON folders(parent_id);

-- Files table. name is the generated storage key; size is a decimal
-- string so values beyond integer range survive round-trips.
CREATE TABLE files (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    name            TEXT NOT NULL,
    original_name   TEXT NOT NULL,
    mime_type       TEXT NOT NULL,
    size            TEXT NOT NULL,
    path            TEXT NOT NULL,
    folder_id       INTEGER REFERENCES folders(id) ON DELETE SET NULL,
    user_id         TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    checksum        TEXT,
    storage_type    TEXT NOT NULL DEFAULT 'local',
    created_at      TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at      TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_files_user_id ON files(user_id);
CREATE INDEX idx_files_folder_id ON files(folder_id);
CREATE INDEX idx_files_original_name ON files(original_name);

-- Share links. share_token carries a UNIQUE constraint; token collisions
-- surface as constraint violations and are retried by the service layer.
CREATE TABLE shared_files (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    file_id             INTEGER NOT NULL REFERENCES files(id) ON DELETE CASCADE,
    shared_by_user_id   TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    share_token         TEXT NOT NULL UNIQUE,
    access_level        TEXT NOT NULL DEFAULT 'view',
    expires_at          TEXT,
    is_active           INTEGER NOT NULL DEFAULT 1,
    created_at          TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_shared_files_file_id ON shared_files(file_id);
CREATE INDEX idx_shared_files_shared_by ON shared_files(shared_by_user_id);
"#,
];
