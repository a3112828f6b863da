//! Worker configuration.

use std::path::PathBuf;
use std::str::FromStr;
use venh_media::DownloadLimits;

/// Per-job resource limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobLimits {
    /// Largest source accepted for download
    pub max_download_bytes: u64,
    /// Largest artifact returned inline
    pub inline_artifact_limit: u64,
    pub head_timeout_secs: u64,
    pub download_timeout_secs: u64,
    pub remux_timeout_secs: u64,
    pub probe_timeout_secs: u64,
}

impl Default for JobLimits {
    fn default() -> Self {
        Self {
            max_download_bytes: 500 * 1024 * 1024,
            inline_artifact_limit: 50 * 1024 * 1024,
            head_timeout_secs: 30,
            download_timeout_secs: 120,
            remux_timeout_secs: 1800,
            probe_timeout_secs: 60,
        }
    }
}

impl JobLimits {
    pub fn download_limits(&self) -> DownloadLimits {
        DownloadLimits {
            max_bytes: self.max_download_bytes,
            head_timeout_secs: self.head_timeout_secs,
            download_timeout_secs: self.download_timeout_secs,
        }
    }
}

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Work directory for temporary files
    pub work_dir: PathBuf,
    /// Where the CLI writes results by default
    pub output_dir: PathBuf,
    /// Root of the enhancer model files
    pub model_dir: PathBuf,
    /// Identity (FaceID) model file
    pub faceid_model: PathBuf,
    /// Fail jobs whose model files are missing
    pub require_models: bool,
    pub limits: JobLimits,
    pub ffmpeg_bin: String,
    pub ffprobe_bin: String,
    /// Frames between progress log lines
    pub progress_log_interval: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("/tmp/venh"),
            output_dir: PathBuf::from("/app/outputs"),
            model_dir: PathBuf::from("/app/enhancers"),
            faceid_model: PathBuf::from("/app/faceID/arcface_w600k_r50.onnx"),
            require_models: false,
            limits: JobLimits::default(),
            ffmpeg_bin: "ffmpeg".to_string(),
            ffprobe_bin: "ffprobe".to_string(),
            progress_log_interval: 100,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let limits = JobLimits {
            max_download_bytes: env_or("MAX_DOWNLOAD_BYTES", defaults.limits.max_download_bytes),
            inline_artifact_limit: env_or(
                "INLINE_ARTIFACT_LIMIT",
                defaults.limits.inline_artifact_limit,
            ),
            head_timeout_secs: env_or("HEAD_TIMEOUT_SECS", defaults.limits.head_timeout_secs),
            download_timeout_secs: env_or(
                "DOWNLOAD_TIMEOUT_SECS",
                defaults.limits.download_timeout_secs,
            ),
            remux_timeout_secs: env_or("REMUX_TIMEOUT_SECS", defaults.limits.remux_timeout_secs),
            probe_timeout_secs: env_or("PROBE_TIMEOUT_SECS", defaults.limits.probe_timeout_secs),
        };

        Self {
            work_dir: env_path("ENHANCER_WORK_DIR", defaults.work_dir),
            output_dir: env_path("ENHANCER_OUTPUT_DIR", defaults.output_dir),
            model_dir: env_path("ENHANCER_MODEL_DIR", defaults.model_dir),
            faceid_model: env_path("ENHANCER_FACEID_MODEL", defaults.faceid_model),
            require_models: std::env::var("ENHANCER_REQUIRE_MODELS")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.require_models),
            limits,
            ffmpeg_bin: std::env::var("FFMPEG_BIN").unwrap_or(defaults.ffmpeg_bin),
            ffprobe_bin: std::env::var("FFPROBE_BIN").unwrap_or(defaults.ffprobe_bin),
            progress_log_interval: env_or("PROGRESS_LOG_INTERVAL", defaults.progress_log_interval),
        }
    }

    /// Override the work directory.
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_path(key: &str, default: PathBuf) -> PathBuf {
    std::env::var(key)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WorkerConfig::default();
        assert_eq!(config.limits.max_download_bytes, 524_288_000);
        assert_eq!(config.limits.inline_artifact_limit, 52_428_800);
        assert_eq!(config.limits.remux_timeout_secs, 1800);
        assert_eq!(config.faceid_model, PathBuf::from("/app/faceID/arcface_w600k_r50.onnx"));
        assert!(!config.require_models);
    }

    #[test]
    fn test_download_limits() {
        let limits = JobLimits::default().download_limits();
        assert_eq!(limits.head_timeout_secs, 30);
        assert_eq!(limits.download_timeout_secs, 120);
    }

    #[test]
    fn test_env_or_falls_back_on_garbage() {
        std::env::set_var("VENH_TEST_ENV_OR", "not-a-number");
        assert_eq!(env_or("VENH_TEST_ENV_OR", 7u64), 7);
        std::env::set_var("VENH_TEST_ENV_OR", " 9 ");
        assert_eq!(env_or("VENH_TEST_ENV_OR", 7u64), 9);
        std::env::remove_var("VENH_TEST_ENV_OR");
    }
}
