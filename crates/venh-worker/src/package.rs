//! Artifact packaging.
//!
//! Small outputs are returned inline as base64. Anything larger fails unless
//! an [`ArtifactSink`] is configured to move it out of band.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;
use venh_models::ArtifactPayload;

use crate::error::{WorkerError, WorkerResult};

/// Default inline limit (50 MiB).
pub const DEFAULT_INLINE_LIMIT: u64 = 50 * 1024 * 1024;

/// Out-of-band delivery of artifacts too large to inline.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Transfer the file at `path` and return a reference to it.
    async fn deliver(&self, path: &Path, size: u64) -> WorkerResult<ArtifactPayload>;
}

/// Size of the artifact at `path`.
pub async fn artifact_size(path: &Path) -> WorkerResult<u64> {
    Ok(tokio::fs::metadata(path).await?.len())
}

/// Read `path` into an inline payload if it is at most `limit` bytes.
pub async fn package_artifact(path: &Path, limit: u64) -> WorkerResult<ArtifactPayload> {
    let size = artifact_size(path).await?;
    if size > limit {
        return Err(WorkerError::ArtifactTooLarge { size, limit });
    }

    let bytes = tokio::fs::read(path).await?;
    Ok(ArtifactPayload::Inline {
        data: STANDARD.encode(&bytes),
        size: bytes.len() as u64,
    })
}

/// Inline when possible, otherwise hand off to `sink` if there is one.
pub async fn package_or_deliver(
    path: &Path,
    limit: u64,
    sink: Option<&dyn ArtifactSink>,
) -> WorkerResult<ArtifactPayload> {
    let size = artifact_size(path).await?;
    match sink {
        Some(sink) if size > limit => sink.deliver(path, size).await,
        _ => package_artifact(path, limit).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    struct RecordingSink;

    #[async_trait]
    impl ArtifactSink for RecordingSink {
        async fn deliver(&self, path: &Path, size: u64) -> WorkerResult<ArtifactPayload> {
            Ok(ArtifactPayload::External {
                url: format!("mem://{}", path.display()),
                size,
            })
        }
    }

    #[tokio::test]
    async fn test_exactly_at_limit_is_inline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mp4");
        std::fs::write(&path, vec![7u8; 64]).unwrap();

        match package_artifact(&path, 64).await.unwrap() {
            ArtifactPayload::Inline { data, size } => {
                assert_eq!(size, 64);
                assert_eq!(STANDARD.decode(data).unwrap(), vec![7u8; 64]);
            }
            other => panic!("expected inline payload, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_one_byte_over_limit_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mp4");
        std::fs::write(&path, vec![7u8; 65]).unwrap();

        let err = assert_err!(package_artifact(&path, 64).await);
        assert!(matches!(
            err,
            WorkerError::ArtifactTooLarge { size: 65, limit: 64 }
        ));
        let message = err.to_string();
        assert!(message.contains("65"));
        assert!(message.contains("64"));
    }

    #[tokio::test]
    async fn test_sink_only_used_over_limit() {
        let dir = tempfile::tempdir().unwrap();
        let small = dir.path().join("small.mp4");
        let large = dir.path().join("large.mp4");
        std::fs::write(&small, vec![1u8; 10]).unwrap();
        std::fs::write(&large, vec![1u8; 20]).unwrap();

        let sink = RecordingSink;
        let inline = assert_ok!(package_or_deliver(&small, 10, Some(&sink)).await);
        assert!(matches!(inline, ArtifactPayload::Inline { size: 10, .. }));

        let external = assert_ok!(package_or_deliver(&large, 10, Some(&sink)).await);
        assert!(matches!(external, ArtifactPayload::External { size: 20, .. }));

        let err = assert_err!(package_or_deliver(&large, 10, None).await);
        assert!(matches!(err, WorkerError::ArtifactTooLarge { .. }));
    }

    #[tokio::test]
    async fn test_missing_artifact_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = package_artifact(&dir.path().join("none.mp4"), 10)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkerError::Io(_)));
    }
}
