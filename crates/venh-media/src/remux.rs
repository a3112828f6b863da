//! Reattach the source audio to the enhanced video.

use std::path::Path;
use tracing::{info, warn};
use venh_models::{RemuxEncoding, RemuxOutcome};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::metrics::record_remux;

/// Default remux timeout.
pub const DEFAULT_REMUX_TIMEOUT_SECS: u64 = 1800;

/// Merges a silent video with the audio track of the original source.
#[derive(Debug, Clone)]
pub struct Remuxer {
    ffmpeg_bin: String,
    timeout_secs: u64,
    encoding: RemuxEncoding,
}

impl Default for Remuxer {
    fn default() -> Self {
        Self::new()
    }
}

impl Remuxer {
    pub fn new() -> Self {
        Self {
            ffmpeg_bin: "ffmpeg".to_string(),
            timeout_secs: DEFAULT_REMUX_TIMEOUT_SECS,
            encoding: RemuxEncoding::default(),
        }
    }

    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.ffmpeg_bin = binary.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_encoding(mut self, encoding: RemuxEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    fn command(&self, silent: &Path, source: &Path, output: &Path) -> FfmpegCommand {
        FfmpegCommand::new(silent, output)
            .add_input(source)
            .output_args(self.encoding.to_ffmpeg_args())
    }

    /// Produce `output` from the silent video and the source's audio.
    ///
    /// If the remux tool fails the silent video is copied to `output`
    /// unchanged. A timeout is fatal and leaves no partial output behind.
    pub async fn remux(
        &self,
        silent: &Path,
        source: &Path,
        output: &Path,
    ) -> MediaResult<RemuxOutcome> {
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let runner = FfmpegRunner::new()
            .with_binary(&self.ffmpeg_bin)
            .with_timeout(self.timeout_secs);
        let cmd = self.command(silent, source, output);

        let outcome = match runner.run(&cmd).await {
            Ok(()) => RemuxOutcome::Merged,
            Err(MediaError::Timeout(secs)) => {
                record_remux("timeout");
                if tokio::fs::remove_file(output).await.is_ok() {
                    warn!(output = %output.display(), "Removed partial remux output");
                }
                return Err(MediaError::RemuxTimeout(secs));
            }
            Err(e) => {
                let stderr = match &e {
                    MediaError::FfmpegFailed { stderr, .. } => stderr.clone().unwrap_or_default(),
                    _ => String::new(),
                };
                warn!(
                    output = %output.display(),
                    stderr = %stderr,
                    "Audio remux failed, delivering video without audio: {}",
                    e
                );
                tokio::fs::copy(silent, output).await?;
                RemuxOutcome::CopiedWithoutAudio
            }
        };

        match tokio::fs::metadata(output).await {
            Ok(meta) if meta.is_file() && meta.len() > 0 => {}
            _ => return Err(MediaError::OutputMissing(output.to_path_buf())),
        }

        record_remux(outcome.as_str());
        info!(output = %output.display(), outcome = outcome.as_str(), "Remux finished");
        Ok(outcome)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use tokio_test::assert_err;

    fn write_script(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn fixture() -> (TempDir, PathBuf, PathBuf, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let silent = dir.path().join("silent.mkv");
        let source = dir.path().join("source.mp4");
        std::fs::write(&silent, b"silent-video-bytes").unwrap();
        std::fs::write(&source, b"source-with-audio").unwrap();
        let output = dir.path().join("out").join("final.mp4");
        (dir, silent, source, output)
    }

    #[test]
    fn test_command_maps_streams() {
        let args = Remuxer::new()
            .command(Path::new("s.mkv"), Path::new("src.mp4"), Path::new("o.mp4"))
            .build_args();
        let inputs: Vec<_> = args
            .windows(2)
            .filter(|w| w[0] == "-i")
            .map(|w| w[1].as_str())
            .collect();
        assert_eq!(inputs, vec!["s.mkv", "src.mp4"]);
        assert!(args.contains(&"-shortest".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("o.mp4"));
    }

    #[tokio::test]
    async fn test_failure_copies_silent_video() {
        let (_dir, silent, source, output) = fixture();
        let outcome = Remuxer::new()
            .with_binary("false")
            .remux(&silent, &source, &output)
            .await
            .unwrap();

        assert_eq!(outcome, RemuxOutcome::CopiedWithoutAudio);
        assert_eq!(std::fs::read(&output).unwrap(), std::fs::read(&silent).unwrap());
    }

    #[tokio::test]
    async fn test_success_is_merged() {
        let (dir, silent, source, output) = fixture();
        let tool = write_script(&dir, "fake-ffmpeg", "for last; do :; done\nprintf merged > \"$last\"");
        let outcome = Remuxer::new()
            .with_binary(tool.to_string_lossy())
            .remux(&silent, &source, &output)
            .await
            .unwrap();

        assert_eq!(outcome, RemuxOutcome::Merged);
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "merged");
    }

    #[tokio::test]
    async fn test_timeout_is_fatal() {
        let (dir, silent, source, output) = fixture();
        let tool = write_script(&dir, "slow-ffmpeg", "exec sleep 30");
        let err = assert_err!(
            Remuxer::new()
                .with_binary(tool.to_string_lossy())
                .with_timeout(1)
                .remux(&silent, &source, &output)
                .await
        );

        assert!(matches!(err, MediaError::RemuxTimeout(1)));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_silent_success_without_output() {
        let (dir, silent, source, output) = fixture();
        let tool = write_script(&dir, "noop-ffmpeg", "exit 0");
        let err = assert_err!(
            Remuxer::new()
                .with_binary(tool.to_string_lossy())
                .remux(&silent, &source, &output)
                .await
        );

        assert!(matches!(err, MediaError::OutputMissing(_)));
    }
}
