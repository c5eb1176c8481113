//! Clubhub - student club platform core
//!
//! Clubs publish posts and events, users subscribe and get notified, and
//! posts are found through a trigram-ranked fuzzy search that runs inside
//! SQLite when it can and in process when it cannot.

pub mod error;
pub mod http;
pub mod search;
pub mod storage;
pub mod types;

pub use error::{ClubhubError, Result};
pub use storage::Storage;
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
