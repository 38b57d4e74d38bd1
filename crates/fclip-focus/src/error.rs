//! Error types for signal loading and scoring.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for focus analysis operations.
pub type FocusResult<T> = Result<T, FocusError>;

#[derive(Debug, Error)]
pub enum FocusError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid log {path}: {message}")]
    InvalidLog { path: PathBuf, message: String },

    #[error("{0} stream is empty")]
    EmptyStream(&'static str),

    #[error("Invalid window configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FocusError {
    pub fn invalid_log(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidLog {
            path: path.into(),
            message: message.into(),
        }
    }
}
