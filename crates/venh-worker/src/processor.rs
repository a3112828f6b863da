//! Enhancement orchestration shared by the job handler and the CLI.
//!
//! Probe the source, run the frame loop into a silent intermediate, then
//! remux the source audio into the final output.

use std::path::PathBuf;
use std::sync::Arc;
use venh_media::{
    EnhancementPipeline, FfmpegFrameIo, FrameIo, Prober, Remuxer,
};
use venh_models::{EnhancementJobConfig, PipelineResult, RemuxOutcome, VideoMetadata};

use crate::backend::{EnhancerBackend, ModelCatalog};
use crate::config::WorkerConfig;
use crate::context::JobContext;
use crate::error::WorkerResult;
use crate::validation::ValidationError;

/// Name of the silent intermediate, scoped per job by the temp set.
const INTERMEDIATE_NAME: &str = "enhanced_video_no_audio.mkv";

/// What one enhancement run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOutcome {
    pub metadata: VideoMetadata,
    pub pipeline: PipelineResult,
    pub remux: RemuxOutcome,
    pub output_path: PathBuf,
}

/// Runs probe, frame loop and remux for one job.
#[derive(Clone)]
pub struct EnhancementProcessor {
    prober: Prober,
    pipeline: EnhancementPipeline,
    remuxer: Remuxer,
    catalog: ModelCatalog,
    backend: Arc<dyn EnhancerBackend>,
}

impl EnhancementProcessor {
    pub fn from_config(config: &WorkerConfig, backend: Arc<dyn EnhancerBackend>) -> Self {
        let frame_io = FfmpegFrameIo::new().with_binary(&config.ffmpeg_bin);
        Self {
            prober: Prober::new()
                .with_binary(&config.ffprobe_bin)
                .with_timeout(config.limits.probe_timeout_secs),
            pipeline: EnhancementPipeline::new(Arc::new(frame_io))
                .with_progress_interval(config.progress_log_interval),
            remuxer: Remuxer::new()
                .with_binary(&config.ffmpeg_bin)
                .with_timeout(config.limits.remux_timeout_secs),
            catalog: ModelCatalog::from_config(config),
            backend,
        }
    }

    /// Replace the frame decoder/encoder.
    pub fn with_frame_io(mut self, io: Arc<dyn FrameIo>, progress_interval: u64) -> Self {
        self.pipeline = EnhancementPipeline::new(io).with_progress_interval(progress_interval);
        self
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Enhance `job.source_path` into `job.output_path`.
    pub async fn process(
        &self,
        ctx: &mut JobContext,
        job: &EnhancementJobConfig,
    ) -> WorkerResult<ProcessOutcome> {
        job.validate().map_err(ValidationError::InvalidConfig)?;

        let spec = self.catalog.spec_for(job);
        let mut transforms = self.backend.build(&spec)?;

        ctx.logger
            .log_progress(&format!("Probing {}", job.source_path.display()));
        let metadata = self.prober.probe(&job.source_path).await?;
        ctx.logger.log_progress(&format!(
            "Source: {}x{} @ {} fps, {} frames",
            metadata.width,
            metadata.height,
            metadata.frame_rate,
            metadata.frame_count
        ));

        let silent = ctx.temp.allocate(INTERMEDIATE_NAME);
        ctx.logger.log_progress(&format!(
            "Enhancing with {}{}",
            job.enhancer,
            if job.identity_selection {
                " and identity selection"
            } else {
                ""
            }
        ));
        let pipeline = self
            .pipeline
            .run(
                &job.source_path,
                &silent,
                &metadata,
                transforms.enhancer.as_mut(),
                transforms
                    .selector
                    .as_deref_mut()
                    .map(|s| s as &mut dyn venh_media::IdentitySelector),
            )
            .await?;

        if let Some(detail) = &pipeline.error_detail {
            ctx.logger.log_warning(detail);
        }
        if pipeline.frames_fallback > 0 {
            ctx.logger.log_warning(&format!(
                "{} of {} frames kept unenhanced",
                pipeline.frames_fallback, pipeline.frames_processed
            ));
        }

        ctx.logger.log_progress("Reattaching audio");
        let remux = self
            .remuxer
            .remux(&silent, &job.source_path, &job.output_path)
            .await?;
        if remux == RemuxOutcome::CopiedWithoutAudio {
            ctx.logger
                .log_warning("Audio could not be reattached; output has no audio track");
        }

        Ok(ProcessOutcome {
            metadata,
            pipeline,
            remux,
            output_path: job.output_path.clone(),
        })
    }
}
