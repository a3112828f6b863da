//! Video enhancement worker.
//!
//! This crate provides:
//! - Job input validation and the job handler
//! - Source acquisition (bounded download or local path)
//! - The enhancement processor shared by the worker and the CLI
//! - Enhancer backends and model resolution
//! - Artifact packaging

pub mod acquire;
pub mod backend;
pub mod config;
pub mod context;
pub mod error;
pub mod handler;
pub mod logging;
pub mod package;
pub mod processor;
pub mod validation;

pub use acquire::{AcquiredSource, SourceAcquirer};
pub use backend::{EnhancerBackend, EnhancerSpec, ModelCatalog, PassthroughBackend, TransformSet};
pub use config::{JobLimits, WorkerConfig};
pub use context::JobContext;
pub use error::{WorkerError, WorkerResult};
pub use handler::JobHandler;
pub use logging::{init_tracing, JobLogger};
pub use package::{package_artifact, package_or_deliver, ArtifactSink, DEFAULT_INLINE_LIMIT};
pub use processor::{EnhancementProcessor, ProcessOutcome};
pub use validation::{validate_input, ValidationError};
