//! Bounded HTTP download of source videos.

use futures_util::StreamExt;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use url::Url;

use crate::error::{MediaError, MediaResult};
use crate::metrics::record_download;

/// Default cap on source size (500 MiB).
pub const DEFAULT_MAX_DOWNLOAD_BYTES: u64 = 500 * 1024 * 1024;
/// Default timeout for the HEAD pre-check.
pub const DEFAULT_HEAD_TIMEOUT_SECS: u64 = 30;
/// Default timeout for the whole transfer.
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 120;

const PROGRESS_LOG_BYTES: u64 = 10 * 1024 * 1024;

/// Limits applied to every download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadLimits {
    pub max_bytes: u64,
    pub head_timeout_secs: u64,
    pub download_timeout_secs: u64,
}

impl Default for DownloadLimits {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_DOWNLOAD_BYTES,
            head_timeout_secs: DEFAULT_HEAD_TIMEOUT_SECS,
            download_timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
        }
    }
}

/// What the HEAD request told us about the source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadCheck {
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
}

/// A finished download.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadSummary {
    pub path: PathBuf,
    pub bytes: u64,
    pub duration_secs: f64,
}

/// Downloads source videos over HTTP(S) within [`DownloadLimits`].
#[derive(Debug, Clone)]
pub struct SourceDownloader {
    client: reqwest::Client,
    limits: DownloadLimits,
}

impl SourceDownloader {
    pub fn new(limits: DownloadLimits) -> MediaResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("venh/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MediaError::download_failed(format!("HTTP client: {}", e)))?;
        Ok(Self { client, limits })
    }

    pub fn limits(&self) -> &DownloadLimits {
        &self.limits
    }

    /// Check that `url` is reachable and not larger than the cap.
    pub async fn head_check(&self, url: &str) -> MediaResult<HeadCheck> {
        let url = parse_http_url(url)?;

        let response = self
            .client
            .head(url.clone())
            .timeout(Duration::from_secs(self.limits.head_timeout_secs))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MediaError::download_rejected(format!(
                        "HEAD request timed out after {} seconds",
                        self.limits.head_timeout_secs
                    ))
                } else {
                    MediaError::download_rejected(format!("HEAD request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(MediaError::download_rejected(format!(
                "HEAD returned HTTP {}",
                status
            )));
        }

        // Read the header directly; reqwest reports no body length for HEAD.
        let content_length = header_u64(response.headers(), CONTENT_LENGTH.as_str());
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if let Some(len) = content_length {
            self.check_size(len)?;
        }

        match content_type.as_deref() {
            Some(ct) if !is_video_content_type(ct) => {
                warn!(url = %url, content_type = ct, "Source may not be a video");
            }
            _ => {}
        }

        Ok(HeadCheck {
            content_length,
            content_type,
        })
    }

    /// Stream `url` into `dest`, enforcing the size cap and the transfer
    /// timeout.
    pub async fn download(&self, url: &str, dest: &Path) -> MediaResult<DownloadSummary> {
        let url = parse_http_url(url)?;
        let started = Instant::now();
        let timeout = Duration::from_secs(self.limits.download_timeout_secs);

        let bytes = match tokio::time::timeout(timeout, self.stream_to_file(&url, dest)).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(url = %url, "Download timed out");
                return Err(MediaError::DownloadTimeout(self.limits.download_timeout_secs));
            }
        };

        if bytes == 0 {
            return Err(MediaError::EmptyDownload(url.to_string()));
        }

        let duration_secs = started.elapsed().as_secs_f64();
        record_download(bytes, duration_secs);
        info!(
            url = %url,
            path = %dest.display(),
            bytes,
            duration_secs = %format!("{:.2}", duration_secs),
            "Download complete"
        );

        Ok(DownloadSummary {
            path: dest.to_path_buf(),
            bytes,
            duration_secs,
        })
    }

    async fn stream_to_file(&self, url: &Url, dest: &Path) -> MediaResult<u64> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| MediaError::download_failed(format!("GET failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MediaError::download_failed(format!("GET returned HTTP {}", status)));
        }

        let total = response.content_length().filter(|len| *len > 0);
        if let Some(len) = total {
            self.check_size(len)?;
        }

        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::File::create(dest).await?;
        let mut downloaded: u64 = 0;
        let mut next_log = PROGRESS_LOG_BYTES;

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| MediaError::download_failed(e.to_string()))?;
            downloaded += chunk.len() as u64;
            self.check_size(downloaded)?;
            file.write_all(&chunk).await?;

            if downloaded >= next_log {
                match total {
                    Some(total) => info!(
                        "Downloaded {} MiB of {} MiB ({:.1}%)",
                        downloaded / (1024 * 1024),
                        total / (1024 * 1024),
                        downloaded as f64 / total as f64 * 100.0
                    ),
                    None => info!("Downloaded {} MiB", downloaded / (1024 * 1024)),
                }
                next_log += PROGRESS_LOG_BYTES;
            }
        }

        file.flush().await?;
        Ok(downloaded)
    }

    fn check_size(&self, bytes: u64) -> MediaResult<()> {
        if bytes > self.limits.max_bytes {
            return Err(MediaError::download_rejected(format!(
                "source is larger than the {} byte limit ({} bytes)",
                self.limits.max_bytes, bytes
            )));
        }
        Ok(())
    }
}

/// Whether `source` looks like an HTTP(S) URL rather than a local path.
pub fn is_remote_source(source: &str) -> bool {
    let lower = source.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn parse_http_url(raw: &str) -> MediaResult<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| MediaError::download_rejected(format!("invalid URL {}: {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(MediaError::download_rejected(format!(
            "unsupported URL scheme: {}",
            other
        ))),
    }
}

fn header_u64(headers: &reqwest::header::HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}

/// `video/*` or a generic binary type.
fn is_video_content_type(content_type: &str) -> bool {
    let ct = content_type.trim().to_ascii_lowercase();
    ct.starts_with("video/") || ct.starts_with("application/octet-stream")
}
