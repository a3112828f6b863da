#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper for per-frame video enhancement.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building and a runner with timeouts
//! - Video probing through FFprobe
//! - Raw frame decoding/encoding over FFmpeg pipes
//! - The per-frame enhancement loop with per-frame fallback
//! - Audio remuxing with a silent-copy fallback
//! - Scoped temporary file tracking
//! - Bounded HTTP source downloads

pub mod command;
pub mod download;
pub mod error;
pub mod frame;
pub mod frame_io;
pub mod metrics;
pub mod pipeline;
pub mod probe;
pub mod progress;
pub mod remux;
pub mod temp;
pub mod transform;

pub use command::{resolve_binary, FfmpegCommand, FfmpegRunner};
pub use download::{
    is_remote_source, DownloadLimits, DownloadSummary, HeadCheck, SourceDownloader,
};
pub use error::{MediaError, MediaResult};
pub use frame::Frame;
pub use frame_io::{FfmpegFrameIo, FrameIo, FrameReader, FrameWriter};
pub use pipeline::EnhancementPipeline;
pub use probe::{parse_probe_output, probe_video, Prober};
pub use progress::{FrameProgress, ProgressSnapshot};
pub use remux::Remuxer;
pub use temp::{CleanupReport, TempResourceSet};
pub use transform::{
    FrameEnhancer, IdentitySelector, KeepEnhancedSelector, PassthroughEnhancer, TransformError,
};
