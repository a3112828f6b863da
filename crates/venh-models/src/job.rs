//! Job definitions for enhancement requests.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::{EnhancerKind, GpenVariant};

/// Blend weight used when a request omits `enhancer_w`.
pub const DEFAULT_ENHANCER_WEIGHT: f32 = 0.5;

/// Identity selection default for job requests. The CLI defaults to off.
pub const DEFAULT_USE_FACEID: bool = true;

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name fragment for this run's temp files.
    ///
    /// Only `[A-Za-z0-9_-]` survives from the id, followed by a random suffix,
    /// so two runs of the same id never share a path.
    pub fn temp_scope(&self) -> String {
        let prefix: String = self
            .0
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
            .take(MAX_SCOPE_PREFIX)
            .collect();
        let suffix = Uuid::new_v4().simple().to_string();
        let suffix = &suffix[..8];
        if prefix.is_empty() {
            suffix.to_string()
        } else {
            format!("{}_{}", prefix, suffix)
        }
    }
}

/// Longest job id fragment carried into temp file names.
const MAX_SCOPE_PREFIX: usize = 48;

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raw job document as delivered by the job runtime.
///
/// `input` is kept untyped so that wrong field types surface as validation
/// errors rather than deserialization failures.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct JobRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub input: serde_json::Value,
}

impl JobRequest {
    pub fn new(input: serde_json::Value) -> Self {
        Self { id: None, input }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Job id supplied by the runtime, or a fresh one.
    pub fn job_id(&self) -> JobId {
        match self.id.as_deref() {
            Some(id) if !id.trim().is_empty() => JobId::from_string(id),
            _ => JobId::new(),
        }
    }
}

/// Validated job input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct JobInput {
    pub video_url: String,
    pub enhancer: EnhancerKind,
    pub use_faceid: bool,
    pub enhancer_w: f32,
    pub gpen_type: GpenVariant,
}

impl JobInput {
    pub fn new(video_url: impl Into<String>) -> Self {
        Self {
            video_url: video_url.into(),
            enhancer: EnhancerKind::default(),
            use_faceid: DEFAULT_USE_FACEID,
            enhancer_w: DEFAULT_ENHANCER_WEIGHT,
            gpen_type: GpenVariant::default(),
        }
    }
}

/// Fully resolved configuration for one enhancement run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EnhancementJobConfig {
    pub source_path: PathBuf,
    pub enhancer: EnhancerKind,
    pub enhancer_weight: f32,
    pub identity_selection: bool,
    pub gpen_variant: GpenVariant,
    pub output_path: PathBuf,
}

impl EnhancementJobConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !is_valid_weight(self.enhancer_weight) {
            return Err(format!(
                "enhancer_w must be between 0 and 1, got {}",
                self.enhancer_weight
            ));
        }
        if self.source_path.as_os_str().is_empty() {
            return Err("source path is empty".to_string());
        }
        if self.output_path.as_os_str().is_empty() {
            return Err("output path is empty".to_string());
        }
        if self.source_path == self.output_path {
            return Err("output path must differ from the source path".to_string());
        }
        Ok(())
    }
}

/// Whether `w` is a usable blend weight.
pub fn is_valid_weight(w: f32) -> bool {
    w.is_finite() && (0.0..=1.0).contains(&w)
}

/// Derive `<output_dir>/<stem>_enhanced_<Enhancer><ext>` for a source file.
pub fn default_output_path(output_dir: &Path, source: &Path, enhancer: EnhancerKind) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());
    let ext = source
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_else(|| ".mp4".to_string());
    output_dir.join(format!("{}_enhanced_{}{}", stem, enhancer.as_str(), ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_id_from_request() {
        let req = JobRequest::new(serde_json::json!({})).with_id("abc");
        assert_eq!(req.job_id().as_str(), "abc");

        let anon = JobRequest::new(serde_json::json!({}));
        assert!(Uuid::parse_str(anon.job_id().as_str()).is_ok());

        let blank = JobRequest::new(serde_json::json!({})).with_id("  ");
        assert_ne!(blank.job_id().as_str(), "  ");
    }

    #[test]
    fn test_temp_scope_is_safe_and_unique() {
        let id = JobId::from_string("a/../../victim");
        let first = id.temp_scope();
        let second = id.temp_scope();
        assert_ne!(first, second);
        assert!(first.starts_with("avictim_"), "{}", first);
        assert!(first
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'));

        let long = JobId::from_string("x".repeat(500));
        assert_eq!(long.temp_scope().len(), MAX_SCOPE_PREFIX + 1 + 8);

        let symbols = JobId::from_string("../..");
        assert_eq!(symbols.temp_scope().len(), 8);
    }

    #[test]
    fn test_request_deserializes_without_id() {
        let req: JobRequest =
            serde_json::from_str(r#"{"input": {"video_url": "https://x/v.mp4"}}"#).unwrap();
        assert!(req.id.is_none());
        assert_eq!(req.input["video_url"], "https://x/v.mp4");
    }

    #[test]
    fn test_job_input_defaults() {
        let input = JobInput::new("https://example.com/a.mp4");
        assert_eq!(input.enhancer, EnhancerKind::Gfpgan);
        assert!(input.use_faceid);
        assert_eq!(input.enhancer_w, 0.5);
        assert_eq!(input.gpen_type, GpenVariant::R256);
    }

    #[test]
    fn test_default_output_path() {
        let out = default_output_path(
            Path::new("/app/outputs"),
            Path::new("/data/clips/face.mov"),
            EnhancerKind::Codeformer,
        );
        assert_eq!(out, PathBuf::from("/app/outputs/face_enhanced_Codeformer.mov"));
    }

    #[test]
    fn test_config_validate() {
        let mut config = EnhancementJobConfig {
            source_path: PathBuf::from("/in.mp4"),
            enhancer: EnhancerKind::Gfpgan,
            enhancer_weight: 0.5,
            identity_selection: false,
            gpen_variant: GpenVariant::R256,
            output_path: PathBuf::from("/out.mp4"),
        };
        assert!(config.validate().is_ok());

        config.enhancer_weight = 1.5;
        assert!(config.validate().is_err());

        config.enhancer_weight = f32::NAN;
        assert!(config.validate().is_err());

        config.enhancer_weight = 1.0;
        config.output_path = PathBuf::from("/in.mp4");
        assert!(config.validate().is_err());
    }
}
