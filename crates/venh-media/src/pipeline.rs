//! Per-frame enhancement loop.
//!
//! Decodes the source frame by frame, runs the enhancer (and optionally the
//! identity selector) on each frame and writes the result to a silent
//! intermediate video. A frame whose transform fails is written unmodified;
//! only problems with the source, the destination or the final output file
//! abort the run.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use venh_models::{PipelineResult, VideoMetadata};

use crate::error::{MediaError, MediaResult};
use crate::frame::Frame;
use crate::frame_io::{FfmpegFrameIo, FrameIo};
use crate::metrics::record_pipeline;
use crate::progress::FrameProgress;
use crate::transform::{FrameEnhancer, IdentitySelector};

/// Default number of frames between progress log lines.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 100;

/// Runs the frame loop over a [`FrameIo`] backend.
#[derive(Clone)]
pub struct EnhancementPipeline {
    io: Arc<dyn FrameIo>,
    progress_interval: u64,
}

impl Default for EnhancementPipeline {
    fn default() -> Self {
        Self::new(Arc::new(FfmpegFrameIo::new()))
    }
}

impl EnhancementPipeline {
    pub fn new(io: Arc<dyn FrameIo>) -> Self {
        Self {
            io,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    pub fn with_progress_interval(mut self, frames: u64) -> Self {
        self.progress_interval = frames.max(1);
        self
    }

    /// Enhance `source` into `dest`.
    ///
    /// Processes `metadata.frame_count` frames, or every decodable frame when
    /// the count is unknown (0). Running out of frames early, or an encoder
    /// that stops accepting them, is reported in `error_detail`, not as an
    /// error.
    pub async fn run(
        &self,
        source: &Path,
        dest: &Path,
        metadata: &VideoMetadata,
        enhancer: &mut dyn FrameEnhancer,
        mut selector: Option<&mut dyn IdentitySelector>,
    ) -> MediaResult<PipelineResult> {
        let started = Instant::now();
        let known_count = metadata.frame_count;

        let mut reader = self.io.open_reader(source, metadata).await?;
        let mut writer = match self.io.open_writer(dest, metadata).await {
            Ok(writer) => writer,
            Err(e) => {
                reader.close().await;
                return Err(e);
            }
        };

        info!(
            source = %source.display(),
            dest = %dest.display(),
            enhancer = enhancer.name(),
            identity_selection = selector.is_some(),
            frames = known_count,
            "Starting enhancement loop"
        );

        let progress = FrameProgress::new(enhancer.name(), known_count, self.progress_interval);
        let mut processed: u64 = 0;
        let mut fallback: u64 = 0;
        let mut early_stop: Option<String> = None;

        while known_count == 0 || processed < known_count {
            let frame = match reader.read_frame().await {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    if known_count > 0 {
                        let detail = format!(
                            "source ended after {} of {} frames",
                            processed, known_count
                        );
                        warn!(source = %source.display(), "{}", detail);
                        early_stop = Some(detail);
                    }
                    break;
                }
                Err(e) => {
                    let detail = format!("frame read failed after {} frames: {}", processed, e);
                    warn!(source = %source.display(), "{}", detail);
                    early_stop = Some(detail);
                    break;
                }
            };

            let (candidate, fell_back) = enhance_frame(enhancer, &frame);
            if fell_back {
                fallback += 1;
            }

            let output = match selector.as_deref_mut() {
                Some(selector) => select_frame(selector, &frame, candidate),
                None => candidate,
            };

            if let Err(e) = writer.write_frame(&output).await {
                let detail = format!("encoder stopped after {} frames: {}", processed, e);
                warn!(dest = %dest.display(), "{}", detail);
                early_stop = Some(detail);
                break;
            }

            processed += 1;
            progress.tick(processed);
        }

        reader.close().await;
        if let Err(e) = writer.finish().await {
            warn!(dest = %dest.display(), "Encoder reported an error: {}", e);
        }

        verify_output(dest).await?;

        let duration = started.elapsed().as_secs_f64();
        record_pipeline(enhancer.name(), processed, fallback, duration);
        info!(
            dest = %dest.display(),
            processed,
            fallback,
            duration_secs = %format!("{:.2}", duration),
            "Enhancement loop finished"
        );

        let requested = if known_count == 0 { processed } else { known_count };
        let result = PipelineResult::completed(dest.to_path_buf(), requested, processed, fallback);
        Ok(match early_stop {
            Some(detail) => result.with_detail(detail),
            None => result,
        })
    }
}

/// Run the enhancer on one frame. Returns the frame to use and whether the
/// original had to be substituted.
fn enhance_frame(enhancer: &mut dyn FrameEnhancer, frame: &Frame) -> (Frame, bool) {
    match enhancer.enhance(frame) {
        Ok(enhanced) if frame.same_shape(&enhanced) => (enhanced, false),
        Ok(enhanced) => {
            warn!(
                frame = frame.index,
                "Enhancer returned {}x{} ({} bytes), expected {}x{}; keeping original",
                enhanced.width,
                enhanced.height,
                enhanced.data.len(),
                frame.width,
                frame.height
            );
            (frame.clone(), true)
        }
        Err(e) => {
            debug!(frame = frame.index, "Enhancement failed, keeping original: {}", e);
            (frame.clone(), true)
        }
    }
}

/// Ask the identity selector to choose; keep the candidate if it cannot.
fn select_frame(selector: &mut dyn IdentitySelector, original: &Frame, candidate: Frame) -> Frame {
    match selector.select(original, &candidate, original) {
        Ok(selected) if original.same_shape(&selected) => selected,
        Ok(_) => {
            warn!(
                frame = original.index,
                "Identity selection returned a malformed frame; keeping enhanced frame"
            );
            candidate
        }
        Err(e) => {
            debug!(frame = original.index, "Identity selection failed: {}", e);
            candidate
        }
    }
}

async fn verify_output(dest: &Path) -> MediaResult<()> {
    match tokio::fs::metadata(dest).await {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(()),
        _ => Err(MediaError::OutputMissing(dest.to_path_buf())),
    }
}
