use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Directory unavailable: {}: {reason}", .path.display())]
    DirectoryUnavailable { path: PathBuf, reason: String },

    #[error("Timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Watcher error: {0}")]
    Watcher(String),
}

impl From<&str> for DomainError {
    fn from(s: &str) -> Self {
        DomainError::InvalidInput(s.to_string())
    }
}

impl From<notify::Error> for DomainError {
    fn from(e: notify::Error) -> Self {
        DomainError::Watcher(e.to_string())
    }
}
