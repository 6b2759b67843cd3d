//! Storage error types.

use thiserror::Error;
use vsplit_media::MediaError;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StorageError {
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound(key.into())
    }

    pub fn invalid_key(key: impl Into<String>) -> Self {
        Self::InvalidKey(key.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}

impl From<MediaError> for StorageError {
    fn from(e: MediaError) -> Self {
        match e {
            MediaError::Io(io) => StorageError::Io(io),
            MediaError::FileNotFound(path) => StorageError::NotFound(path.display().to_string()),
            other => StorageError::Io(std::io::Error::other(other.to_string())),
        }
    }
}
