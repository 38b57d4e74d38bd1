//! Worker error types.

use std::path::PathBuf;
use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Input missing: {0}")]
    InputMissing(PathBuf),

    #[error("{stage} stage failed: {message}")]
    StageFailed { stage: &'static str, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported request: {0}")]
    Unsupported(String),

    #[error("Focus analysis error: {0}")]
    Focus(#[from] fclip_focus::FocusError),

    #[error("Media error: {0}")]
    Media(#[from] fclip_media::MediaError),

    #[error("Request error: {0}")]
    Request(#[from] fclip_models::RequestError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WorkerError {
    pub fn stage_failed(stage: &'static str, err: impl std::fmt::Display) -> Self {
        Self::StageFailed {
            stage,
            message: err.to_string(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the run stopped before any stage executed.
    pub fn is_input_error(&self) -> bool {
        matches!(self, WorkerError::InputMissing(_) | WorkerError::Config(_))
    }
}
