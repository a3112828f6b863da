//! Pipeline and job results.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::EnhancerKind;

/// Outcome of the per-frame enhancement loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PipelineResult {
    pub frames_requested: u64,
    pub frames_processed: u64,
    /// Frames written unmodified because their transform failed.
    pub frames_fallback: u64,
    pub output_path: PathBuf,
    pub succeeded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl PipelineResult {
    /// Successful run. `processed` and `fallback` are clamped so that
    /// `fallback <= processed <= requested` always holds.
    pub fn completed(
        output_path: PathBuf,
        requested: u64,
        processed: u64,
        fallback: u64,
    ) -> Self {
        let frames_processed = processed.min(requested);
        Self {
            frames_requested: requested,
            frames_processed,
            frames_fallback: fallback.min(frames_processed),
            output_path,
            succeeded: true,
            error_detail: None,
        }
    }

    pub fn failed(output_path: PathBuf, requested: u64, detail: impl Into<String>) -> Self {
        Self {
            frames_requested: requested,
            frames_processed: 0,
            frames_fallback: 0,
            output_path,
            succeeded: false,
            error_detail: Some(detail.into()),
        }
    }

    /// Attach a non-fatal note, e.g. an early end of input.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.error_detail = Some(detail.into());
        self
    }

    /// True when the source ran out before `frames_requested` was reached.
    pub fn stopped_early(&self) -> bool {
        self.frames_processed < self.frames_requested
    }
}

/// How the final artifact was assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RemuxOutcome {
    /// Enhanced video merged with the source audio.
    Merged,
    /// Remux failed; the silent video was copied verbatim.
    CopiedWithoutAudio,
}

impl RemuxOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemuxOutcome::Merged => "merged",
            RemuxOutcome::CopiedWithoutAudio => "copied_without_audio",
        }
    }

    pub fn has_audio(&self) -> bool {
        matches!(self, RemuxOutcome::Merged)
    }
}

/// Finished artifact, ready to hand back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactPayload {
    /// Base64-encoded file contents.
    Inline { data: String, size: u64 },
    /// Reference to an artifact transferred out of band.
    External { url: String, size: u64 },
}

impl ArtifactPayload {
    pub fn size(&self) -> u64 {
        match self {
            ArtifactPayload::Inline { size, .. } | ArtifactPayload::External { size, .. } => *size,
        }
    }
}

/// Payload of a successful job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct JobOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_inline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_url: Option<String>,
    pub file_size: u64,
    pub enhancer_used: EnhancerKind,
    pub faceid_used: bool,
    pub enhancer_weight: f32,
    pub remux: RemuxOutcome,
    pub frames_processed: u64,
    pub frames_requested: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct JobSuccess {
    pub status: String,
    pub message: String,
    pub output: JobOutput,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct JobFailure {
    pub error: String,
}

/// Result returned for every job: exactly one of success or failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum JobResult {
    Success(JobSuccess),
    Failure(JobFailure),
}

impl JobResult {
    pub fn success(
        payload: ArtifactPayload,
        enhancer: EnhancerKind,
        faceid_used: bool,
        enhancer_weight: f32,
        remux: RemuxOutcome,
        pipeline: &PipelineResult,
    ) -> Self {
        let file_size = payload.size();
        let (artifact_inline, artifact_url) = match payload {
            ArtifactPayload::Inline { data, .. } => (Some(data), None),
            ArtifactPayload::External { url, .. } => (None, Some(url)),
        };
        let message = match remux {
            RemuxOutcome::Merged => "Video enhancement completed successfully".to_string(),
            RemuxOutcome::CopiedWithoutAudio => {
                "Video enhancement completed without audio (remux failed)".to_string()
            }
        };

        JobResult::Success(JobSuccess {
            status: "success".to_string(),
            message,
            output: JobOutput {
                artifact_inline,
                artifact_url,
                file_size,
                enhancer_used: enhancer,
                faceid_used,
                enhancer_weight,
                remux,
                frames_processed: pipeline.frames_processed,
                frames_requested: pipeline.frames_requested,
            },
            completed_at: Utc::now(),
        })
    }

    pub fn failure(error: impl Into<String>) -> Self {
        JobResult::Failure(JobFailure {
            error: error.into(),
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, JobResult::Success(_))
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            JobResult::Failure(f) => Some(&f.error),
            JobResult::Success(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_result_clamps() {
        let r = PipelineResult::completed(PathBuf::from("/o.mkv"), 10, 12, 15);
        assert_eq!(r.frames_processed, 10);
        assert_eq!(r.frames_fallback, 10);
        assert!(!r.stopped_early());

        let early = PipelineResult::completed(PathBuf::from("/o.mkv"), 10, 4, 0);
        assert!(early.stopped_early());
    }

    #[test]
    fn test_failure_shape() {
        let json = serde_json::to_value(JobResult::failure("boom")).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "boom" }));
    }

    #[test]
    fn test_success_shape() {
        let pipeline = PipelineResult::completed(PathBuf::from("/o.mkv"), 10, 10, 0);
        let result = JobResult::success(
            ArtifactPayload::Inline {
                data: "AAEC".to_string(),
                size: 3,
            },
            EnhancerKind::Gfpgan,
            true,
            0.5,
            RemuxOutcome::Merged,
            &pipeline,
        );
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "success");
        assert!(json.get("error").is_none());
        let output = &json["output"];
        assert_eq!(output["artifact_inline"], "AAEC");
        assert!(output.get("artifact_url").is_none());
        assert_eq!(output["file_size"], 3);
        assert_eq!(output["enhancer_used"], "GFPGAN");
        assert_eq!(output["faceid_used"], true);
        assert_eq!(output["enhancer_weight"], 0.5);
        assert_eq!(output["remux"], "merged");
    }

    #[test]
    fn test_untagged_roundtrip_picks_variant() {
        let failure: JobResult = serde_json::from_str(r#"{"error":"x"}"#).unwrap();
        assert_eq!(failure.error(), Some("x"));
        assert!(!failure.is_success());
    }
}
