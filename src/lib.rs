//! Nimbus - personal cloud file storage
//!
//! A self-hosted file storage service with folders, batch uploads,
//! search, and tokenized share links, exposed over a REST API.

pub mod config;
pub mod db;
pub mod error;
pub mod file;
pub mod logging;
pub mod share;
pub mod web;

pub use config::Config;
pub use db::{Database, UpsertUser, User, UserRepository};
pub use error::{NimbusError, Result};
pub use file::{
    FileKind, FileRecord, FileRepository, FileService, FileStorage, FileUpdate, Folder,
    FolderRepository, FolderUpdate, NewFileRecord, NewFolder, UploadItem,
};
pub use share::{AccessLevel, ShareLink, ShareRepository, ShareService};
pub use web::WebServer;
