//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during media processing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found: {0}")]
    FfmpegNotFound(String),

    #[error("FFprobe not found: {0}")]
    FfprobeNotFound(String),

    #[error("Could not open media {path}: {reason}")]
    MediaOpen { path: PathBuf, reason: String },

    #[error("Invalid media: {0}")]
    InvalidMedia(String),

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("Remux timed out after {0} seconds")]
    RemuxTimeout(u64),

    #[error("Download timed out after {0} seconds")]
    DownloadTimeout(u64),

    #[error("Download rejected: {0}")]
    DownloadRejected(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Downloaded file is empty: {0}")]
    EmptyDownload(String),

    #[error("Output file missing or empty: {0}")]
    OutputMissing(PathBuf),

    #[error("Failed to write frame {frame}: {reason}")]
    FrameWrite { frame: u64, reason: String },

    #[error("Frame size mismatch: expected {expected} bytes, got {actual}")]
    FrameSize { expected: usize, actual: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create a media open error.
    pub fn media_open(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MediaOpen {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_media(message: impl Into<String>) -> Self {
        Self::InvalidMedia(message.into())
    }

    pub fn download_rejected(message: impl Into<String>) -> Self {
        Self::DownloadRejected(message.into())
    }

    pub fn download_failed(message: impl Into<String>) -> Self {
        Self::DownloadFailed(message.into())
    }

    pub fn frame_write(frame: u64, reason: impl Into<String>) -> Self {
        Self::FrameWrite {
            frame,
            reason: reason.into(),
        }
    }

    /// Whether retrying the same job could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            MediaError::Timeout(_)
                | MediaError::DownloadTimeout(_)
                | MediaError::DownloadFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = MediaError::media_open("/x.mp4", "no such file");
        assert_eq!(err.to_string(), "Could not open media /x.mp4: no such file");

        let err = MediaError::RemuxTimeout(1800);
        assert!(err.to_string().contains("1800"));
    }

    #[test]
    fn test_transient() {
        assert!(MediaError::DownloadTimeout(120).is_transient());
        assert!(!MediaError::EmptyDownload("u".into()).is_transient());
        assert!(!MediaError::OutputMissing(PathBuf::from("/o")).is_transient());
    }
}
