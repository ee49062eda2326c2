//! Web API module for Nimbus.
//!
//! This module provides the REST API: folder and file management,
//! uploads and downloads, share links, and the current-user endpoint.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use router::create_router;
pub use server::WebServer;
