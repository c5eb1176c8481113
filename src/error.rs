//! Error types for Clubhub

use thiserror::Error;

/// Result type alias for Clubhub operations
pub type Result<T> = std::result::Result<T, ClubhubError>;

/// Main error type for Clubhub
#[derive(Error, Debug)]
pub enum ClubhubError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ClubhubError {
    /// Shorthand for a missing row
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        ClubhubError::NotFound { entity, id }
    }

    /// HTTP status code the REST layer answers with
    pub fn status_code(&self) -> u16 {
        match self {
            ClubhubError::NotFound { .. } => 404,
            ClubhubError::InvalidInput(_) => 400,
            _ => 500,
        }
    }
}
