//! Worker error types.

use std::path::PathBuf;
use thiserror::Error;

use crate::validation::ValidationError;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("Source not found: {0}")]
    SourceNotFound(String),

    #[error("Model file not found: {}", .0.display())]
    ModelNotFound(PathBuf),

    #[error("Enhancer backend failed: {0}")]
    Backend(String),

    #[error(
        "Output video too large ({size} bytes) for inline return, limit is {limit} bytes"
    )]
    ArtifactTooLarge { size: u64, limit: u64 },

    #[error("Artifact delivery failed: {0}")]
    Delivery(String),

    #[error("Job aborted: {0}")]
    JobPanicked(String),

    #[error("{0}")]
    Media(#[from] venh_media::MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn source_not_found(source: impl Into<String>) -> Self {
        Self::SourceNotFound(source.into())
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    pub fn delivery(msg: impl Into<String>) -> Self {
        Self::Delivery(msg.into())
    }

    /// Whether the caller's input, rather than the environment, is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            WorkerError::Validation(_)
                | WorkerError::SourceNotFound(_)
                | WorkerError::ArtifactTooLarge { .. }
        )
    }

    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            WorkerError::Media(e) => e.is_transient(),
            WorkerError::Delivery(_) => true,
            _ => false,
        }
    }
}
