//! Metrics emitted by the media stages.
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! host process installs a recorder.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const FRAMES_PROCESSED_TOTAL: &str = "venh_frames_processed_total";
    pub const FRAMES_FALLBACK_TOTAL: &str = "venh_frames_fallback_total";
    pub const PIPELINE_DURATION_SECONDS: &str = "venh_pipeline_duration_seconds";
    pub const REMUX_TOTAL: &str = "venh_remux_total";
    pub const DOWNLOAD_BYTES_TOTAL: &str = "venh_download_bytes_total";
    pub const DOWNLOAD_DURATION_SECONDS: &str = "venh_download_duration_seconds";
}

/// Record a finished frame loop.
pub fn record_pipeline(enhancer: &str, processed: u64, fallback: u64, duration_secs: f64) {
    let labels = [("enhancer", enhancer.to_string())];
    counter!(names::FRAMES_PROCESSED_TOTAL, &labels).increment(processed);
    counter!(names::FRAMES_FALLBACK_TOTAL, &labels).increment(fallback);
    histogram!(names::PIPELINE_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a remux by outcome (`merged`, `copied_without_audio`, `timeout`).
pub fn record_remux(outcome: &str) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::REMUX_TOTAL, &labels).increment(1);
}

/// Record a completed download.
pub fn record_download(bytes: u64, duration_secs: f64) {
    counter!(names::DOWNLOAD_BYTES_TOTAL).increment(bytes);
    histogram!(names::DOWNLOAD_DURATION_SECONDS).record(duration_secs);
}
