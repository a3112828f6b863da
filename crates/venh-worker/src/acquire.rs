//! Source acquisition: download remote videos, resolve local ones.

use std::path::{Path, PathBuf};
use url::Url;
use venh_media::{is_remote_source, SourceDownloader};

use crate::config::JobLimits;
use crate::context::JobContext;
use crate::error::{WorkerError, WorkerResult};

/// Extensions the enhancer is known to handle.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "wmv", "flv", "webm"];

/// A source video ready for processing.
#[derive(Debug, Clone, PartialEq)]
pub struct AcquiredSource {
    pub path: PathBuf,
    /// True when the file was downloaded into the job's temp set.
    pub downloaded: bool,
    pub bytes: u64,
}

/// Turns a `video_url` into a local file.
#[derive(Debug, Clone)]
pub struct SourceAcquirer {
    downloader: SourceDownloader,
}

impl SourceAcquirer {
    pub fn new(limits: &JobLimits) -> WorkerResult<Self> {
        Ok(Self {
            downloader: SourceDownloader::new(limits.download_limits())?,
        })
    }

    /// Remote sources are downloaded into a tracked temp file; local paths
    /// (plain or `file://`) are used in place and never deleted.
    pub async fn acquire(&self, ctx: &mut JobContext, source: &str) -> WorkerResult<AcquiredSource> {
        if is_remote_source(source) {
            self.download(ctx, source).await
        } else {
            resolve_local(ctx, source).await
        }
    }

    async fn download(&self, ctx: &mut JobContext, url: &str) -> WorkerResult<AcquiredSource> {
        ctx.logger.log_progress(&format!("Checking source {}", url));
        let head = self.downloader.head_check(url).await?;
        if let Some(len) = head.content_length {
            ctx.logger
                .log_progress(&format!("Source size: {:.2} MB", len as f64 / (1024.0 * 1024.0)));
        }

        let dest = ctx
            .temp
            .allocate(&format!("input_video.{}", extension_from_url(url)));
        ctx.logger.log_progress("Downloading source");
        let summary = self.downloader.download(url, &dest).await?;

        Ok(AcquiredSource {
            path: summary.path,
            downloaded: true,
            bytes: summary.bytes,
        })
    }
}

async fn resolve_local(ctx: &JobContext, source: &str) -> WorkerResult<AcquiredSource> {
    let path = local_path(source).ok_or_else(|| WorkerError::source_not_found(source))?;

    let meta = match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => meta,
        _ => return Err(WorkerError::source_not_found(path.display().to_string())),
    };

    if !has_supported_extension(&path) {
        ctx.logger.log_warning(&format!(
            "{} does not have a known video extension ({})",
            path.display(),
            SUPPORTED_EXTENSIONS.join(", ")
        ));
    }

    Ok(AcquiredSource {
        path,
        downloaded: false,
        bytes: meta.len(),
    })
}

fn local_path(source: &str) -> Option<PathBuf> {
    let source = source.trim();
    if source.is_empty() {
        return None;
    }
    if source.starts_with("file://") {
        return Url::parse(source).ok()?.to_file_path().ok();
    }
    Some(PathBuf::from(source))
}

/// Extension for the downloaded file, `mp4` unless the URL names a known one.
fn extension_from_url(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| {
            let segment = u.path_segments()?.last()?.to_string();
            Path::new(&segment)
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
        })
        .filter(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or_else(|| "mp4".to_string())
}

pub fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|e| SUPPORTED_EXTENSIONS.contains(&e.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorkerConfig;
    use venh_models::JobId;

    #[test]
    fn test_extension_from_url() {
        assert_eq!(extension_from_url("https://x.test/v/clip.MOV?sig=1"), "mov");
        assert_eq!(extension_from_url("https://x.test/v/clip"), "mp4");
        assert_eq!(extension_from_url("https://x.test/v/clip.exe"), "mp4");
    }

    #[test]
    fn test_local_path() {
        assert_eq!(local_path("/data/a.mp4"), Some(PathBuf::from("/data/a.mp4")));
        assert_eq!(local_path("file:///data/a.mp4"), Some(PathBuf::from("/data/a.mp4")));
        assert_eq!(local_path("  "), None);
    }

    #[tokio::test]
    async fn test_local_source_is_not_tracked() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("face.mp4");
        std::fs::write(&source, b"video").unwrap();

        let config = WorkerConfig::default().with_work_dir(dir.path().join("work"));
        let mut ctx = JobContext::new(JobId::from_string("local"), "test", &config);
        let acquirer = SourceAcquirer::new(&config.limits).unwrap();

        let acquired = acquirer
            .acquire(&mut ctx, source.to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(acquired.path, source);
        assert!(!acquired.downloaded);
        assert_eq!(acquired.bytes, 5);
        assert!(ctx.temp.paths().is_empty());

        ctx.release();
        assert!(source.exists());
    }

    #[tokio::test]
    async fn test_missing_local_source() {
        let dir = tempfile::tempdir().unwrap();
        let config = WorkerConfig::default().with_work_dir(dir.path());
        let mut ctx = JobContext::new(JobId::from_string("missing"), "test", &config);
        let acquirer = SourceAcquirer::new(&config.limits).unwrap();

        let err = acquirer
            .acquire(&mut ctx, "/nonexistent/video.mp4")
            .await
            .unwrap_err();
        assert!(matches!(err, WorkerError::SourceNotFound(_)));
    }
}
