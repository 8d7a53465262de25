use thiserror::Error;

/// Failure categories surfaced by collection operations.
///
/// `Validation` and `NotFound` leave the collection untouched. `Persistence`
/// is raised after the in-memory change has already been applied.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Failed to persist collection: {0}")]
    Persistence(#[from] StorageError),
}

impl TrackerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        TrackerError::Validation(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        TrackerError::NotFound(what.into())
    }

    pub fn is_persistence(&self) -> bool {
        matches!(self, TrackerError::Persistence(_))
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage quota exceeded: {needed} bytes needed, {limit} bytes allowed")]
    QuotaExceeded { needed: usize, limit: usize },
}

pub type TrackerResult<T> = Result<T, TrackerError>;
