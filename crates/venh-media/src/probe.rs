//! FFprobe video information.

use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;
use venh_models::{FrameRate, VideoMetadata};

use crate::error::{MediaError, MediaResult};

/// Default probe timeout.
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 60;

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    nb_frames: Option<String>,
    duration: Option<String>,
}

/// Runs FFprobe with a bounded timeout.
#[derive(Debug, Clone)]
pub struct Prober {
    ffprobe_bin: String,
    timeout_secs: u64,
}

impl Default for Prober {
    fn default() -> Self {
        Self::new()
    }
}

impl Prober {
    pub fn new() -> Self {
        Self {
            ffprobe_bin: "ffprobe".to_string(),
            timeout_secs: DEFAULT_PROBE_TIMEOUT_SECS,
        }
    }

    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.ffprobe_bin = binary.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Probe a video file for frame rate, dimensions and frame count.
    ///
    /// The FFprobe process has exited (or been killed) by the time this
    /// returns.
    pub async fn probe(&self, path: impl AsRef<Path>) -> MediaResult<VideoMetadata> {
        let path = path.as_ref();

        if !path.is_file() {
            return Err(MediaError::media_open(path, "file does not exist"));
        }

        let program = which::which(&self.ffprobe_bin)
            .map_err(|_| MediaError::FfprobeNotFound(self.ffprobe_bin.clone()))?;

        let output_future = Command::new(program)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output =
            match tokio::time::timeout(Duration::from_secs(self.timeout_secs), output_future).await
            {
                Ok(result) => result?,
                Err(_) => return Err(MediaError::Timeout(self.timeout_secs)),
            };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(MediaError::media_open(
                path,
                if stderr.is_empty() {
                    format!("ffprobe exited with {}", output.status)
                } else {
                    stderr
                },
            ));
        }

        let metadata = parse_probe_output(path, &output.stdout)?;
        debug!(
            path = %path.display(),
            width = metadata.width,
            height = metadata.height,
            fps = %metadata.frame_rate,
            frames = metadata.frame_count,
            "Probed video"
        );
        Ok(metadata)
    }
}

/// Probe a video file with default settings.
pub async fn probe_video(path: impl AsRef<Path>) -> MediaResult<VideoMetadata> {
    Prober::new().probe(path).await
}

/// Interpret FFprobe JSON output.
pub fn parse_probe_output(path: &Path, json: &[u8]) -> MediaResult<VideoMetadata> {
    let probe: FfprobeOutput = serde_json::from_slice(json)
        .map_err(|e| MediaError::media_open(path, format!("unreadable probe output: {}", e)))?;

    let video_stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| MediaError::media_open(path, "no video stream found"))?;

    let frame_rate = [&video_stream.avg_frame_rate, &video_stream.r_frame_rate]
        .into_iter()
        .flatten()
        .filter_map(|r| r.parse::<FrameRate>().ok())
        .find(FrameRate::is_positive)
        .ok_or_else(|| {
            MediaError::invalid_media(format!(
                "frame rate must be positive (avg={:?}, r={:?})",
                video_stream.avg_frame_rate, video_stream.r_frame_rate
            ))
        })?;

    let width = video_stream.width.unwrap_or(0);
    let height = video_stream.height.unwrap_or(0);
    if width == 0 || height == 0 {
        return Err(MediaError::invalid_media(format!(
            "dimensions must be positive, got {}x{}",
            width, height
        )));
    }

    let frame_count = video_stream
        .nb_frames
        .as_ref()
        .and_then(|n| n.parse::<u64>().ok())
        .filter(|n| *n > 0)
        .or_else(|| {
            let duration = video_stream
                .duration
                .as_ref()
                .or(probe.format.as_ref().and_then(|f| f.duration.as_ref()))
                .and_then(|d| d.parse::<f64>().ok())
                .filter(|d| d.is_finite() && *d > 0.0)?;
            Some((duration * frame_rate.as_f64()).round() as u64)
        })
        .unwrap_or(0);

    Ok(VideoMetadata::new(frame_rate, width, height, frame_count))
}
