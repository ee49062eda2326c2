//! Share links for Nimbus.
//!
//! Submodules:
//! - `link`: share link records and repository
//! - `service`: token generation, resolution, and revocation

pub mod link;
pub mod service;

pub use link::{AccessLevel, NewShareLink, ShareLink, ShareRepository};
pub use service::ShareService;
