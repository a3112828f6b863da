//! Shared data models for the video enhancer.
//!
//! This crate provides Serde-serializable types for:
//! - Enhancer kinds and model variants
//! - Job requests, validated job input and job configuration
//! - Video metadata produced by the probe
//! - Encoding profiles for the intermediate and final video
//! - Pipeline and job results

pub mod encoding;
pub mod enhancer;
pub mod job;
pub mod result;
pub mod video;

// Re-export common types
pub use encoding::{IntermediateProfile, RemuxEncoding};
pub use enhancer::{EnhancerKind, EnhancerParseError, GpenVariant, GpenVariantParseError};
pub use job::{EnhancementJobConfig, JobId, JobInput, JobRequest};
pub use result::{
    ArtifactPayload, JobFailure, JobOutput, JobResult, JobSuccess, PipelineResult, RemuxOutcome,
};
pub use video::{FrameRate, FrameRateParseError, VideoMetadata};
