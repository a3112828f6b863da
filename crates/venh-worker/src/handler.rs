//! Job handler: validate, acquire, process, package, clean up.
//!
//! [`JobHandler::handle`] is total. Every error, including a panic inside a
//! backend, comes back as a [`JobResult::Failure`].

use metrics::{counter, histogram};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, Instrument};
use venh_media::FrameIo;
use venh_models::{EnhancementJobConfig, EnhancerKind, JobId, JobInput, JobRequest, JobResult};

use crate::acquire::SourceAcquirer;
use crate::backend::EnhancerBackend;
use crate::config::WorkerConfig;
use crate::context::JobContext;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::package::{package_or_deliver, ArtifactSink};
use crate::processor::EnhancementProcessor;
use crate::validation::validate_input;

const OPERATION: &str = "enhance_job";

const JOBS_TOTAL: &str = "venh_jobs_total";
const JOB_DURATION_SECONDS: &str = "venh_job_duration_seconds";

/// Processes job documents end to end.
#[derive(Clone)]
pub struct JobHandler {
    config: Arc<WorkerConfig>,
    processor: Arc<EnhancementProcessor>,
    acquirer: Arc<SourceAcquirer>,
    sink: Option<Arc<dyn ArtifactSink>>,
}

impl JobHandler {
    pub fn new(config: WorkerConfig, backend: Arc<dyn EnhancerBackend>) -> WorkerResult<Self> {
        let acquirer = SourceAcquirer::new(&config.limits)?;
        let processor = EnhancementProcessor::from_config(&config, backend);
        Ok(Self {
            config: Arc::new(config),
            processor: Arc::new(processor),
            acquirer: Arc::new(acquirer),
            sink: None,
        })
    }

    /// Replace the frame decoder/encoder used by the pipeline.
    pub fn with_frame_io(mut self, io: Arc<dyn FrameIo>) -> Self {
        let processor = self
            .processor
            .as_ref()
            .clone()
            .with_frame_io(io, self.config.progress_log_interval);
        self.processor = Arc::new(processor);
        self
    }

    /// Deliver artifacts over the inline limit through `sink`.
    pub fn with_artifact_sink(mut self, sink: Arc<dyn ArtifactSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Handle one job document.
    pub async fn handle(&self, request: JobRequest) -> JobResult {
        let started = Instant::now();
        let job_id = request.job_id();
        tracing::debug!(job_id = %job_id, "Received job");

        let handler = self.clone();
        let task_job_id = job_id.clone();
        let task = tokio::spawn(async move { handler.run(task_job_id, request.input).await });

        let result = match task.await {
            Ok(result) => result,
            Err(e) => {
                let err = WorkerError::JobPanicked(e.to_string());
                error!(job_id = %job_id, "Job task failed: {}", err);
                JobResult::failure(err.to_string())
            }
        };

        record_job(&result, started.elapsed().as_secs_f64());
        result
    }

    async fn run(&self, job_id: JobId, input: Value) -> JobResult {
        let logger = JobLogger::new(&job_id, OPERATION);
        let span = logger.create_span();

        async move {
            let input = match validate_input(&input) {
                Ok(input) => input,
                Err(e) => {
                    let err = WorkerError::from(e);
                    logger.log_error(&err.to_string());
                    return JobResult::failure(err.to_string());
                }
            };

            logger.log_start(&format!(
                "{} (weight {}, faceid {}) for {}",
                input.enhancer, input.enhancer_w, input.use_faceid, input.video_url
            ));

            let mut ctx = JobContext::new(job_id, OPERATION, &self.config);
            let outcome = self.execute(&mut ctx, &input).await;
            let report = ctx.release();

            match outcome {
                Ok(result) => {
                    logger.log_completion(&format!(
                        "{} temp file(s) removed",
                        report.removed.len()
                    ));
                    result
                }
                Err(e) => {
                    logger.log_error(&e.to_string());
                    JobResult::failure(e.to_string())
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn execute(&self, ctx: &mut JobContext, input: &JobInput) -> WorkerResult<JobResult> {
        let source = self.acquirer.acquire(ctx, &input.video_url).await?;
        let output_path = ctx.temp.allocate(&output_name(&source.path, input.enhancer));

        let job = EnhancementJobConfig {
            source_path: source.path,
            enhancer: input.enhancer,
            enhancer_weight: input.enhancer_w,
            identity_selection: input.use_faceid,
            gpen_variant: input.gpen_type,
            output_path,
        };
        let outcome = self.processor.process(ctx, &job).await?;

        let payload = package_or_deliver(
            &outcome.output_path,
            ctx.limits.inline_artifact_limit,
            self.sink.as_deref(),
        )
        .await?;

        Ok(JobResult::success(
            payload,
            input.enhancer,
            input.use_faceid,
            input.enhancer_w,
            outcome.remux,
            &outcome.pipeline,
        ))
    }
}

/// `<stem>_enhanced_<Enhancer>.mp4`, scoped further by the temp set.
fn output_name(source: &Path, enhancer: EnhancerKind) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());
    format!("{}_enhanced_{}.mp4", stem, enhancer.as_str())
}

fn record_job(result: &JobResult, duration_secs: f64) {
    let status = if result.is_success() { "success" } else { "failure" };
    let labels = [("status", status.to_string())];
    counter!(JOBS_TOTAL, &labels).increment(1);
    histogram!(JOB_DURATION_SECONDS, &labels).record(duration_secs);
}
