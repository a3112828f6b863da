//! Frame loop progress accounting.

use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

/// Snapshot of the frame loop's progress.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Frames written so far
    pub frame: u64,
    /// Frames expected in total (0 when unknown)
    pub total: u64,
    /// Frames per second since the loop started
    pub fps: f64,
    /// Seconds since the loop started
    pub elapsed_secs: f64,
}

impl ProgressSnapshot {
    /// Progress percentage, 0 when the total is unknown.
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        ((self.frame as f64 / self.total as f64) * 100.0).min(100.0)
    }

    /// Estimate time remaining in seconds.
    pub fn eta_seconds(&self) -> Option<f64> {
        if self.fps <= 0.0 || self.total == 0 {
            return None;
        }
        let remaining = self.total.saturating_sub(self.frame);
        Some(remaining as f64 / self.fps)
    }
}

/// Logs loop progress every `interval` frames.
#[derive(Debug)]
pub struct FrameProgress {
    label: String,
    total: u64,
    interval: u64,
    started: Instant,
}

impl FrameProgress {
    pub fn new(label: impl Into<String>, total: u64, interval: u64) -> Self {
        Self {
            label: label.into(),
            total,
            interval: interval.max(1),
            started: Instant::now(),
        }
    }

    pub fn snapshot(&self, frame: u64) -> ProgressSnapshot {
        let elapsed_secs = self.started.elapsed().as_secs_f64();
        let fps = if elapsed_secs > 0.0 {
            frame as f64 / elapsed_secs
        } else {
            0.0
        };
        ProgressSnapshot {
            frame,
            total: self.total,
            fps,
            elapsed_secs,
        }
    }

    /// Record that `frame` frames are done; logs on interval boundaries and
    /// at the last frame.
    pub fn tick(&self, frame: u64) -> Option<ProgressSnapshot> {
        if frame == 0 || (frame % self.interval != 0 && frame != self.total) {
            return None;
        }
        let snapshot = self.snapshot(frame);
        info!(
            label = %self.label,
            frame = snapshot.frame,
            total = snapshot.total,
            percent = %format!("{:.1}", snapshot.percentage()),
            fps = %format!("{:.2}", snapshot.fps),
            eta_secs = ?snapshot.eta_seconds().map(|s| s.round() as u64),
            "Enhancement progress"
        );
        Some(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percentage() {
        let snapshot = ProgressSnapshot {
            frame: 5,
            total: 10,
            ..Default::default()
        };
        assert!((snapshot.percentage() - 50.0).abs() < 0.01);

        let unknown = ProgressSnapshot {
            frame: 5,
            total: 0,
            ..Default::default()
        };
        assert_eq!(unknown.percentage(), 0.0);
    }

    #[test]
    fn test_eta_calculation() {
        let snapshot = ProgressSnapshot {
            frame: 50,
            total: 100,
            fps: 10.0,
            elapsed_secs: 5.0,
        };
        // 50 frames remaining at 10 fps
        let eta = snapshot.eta_seconds().unwrap();
        assert!((eta - 5.0).abs() < 0.01);
    }

    #[test]
    fn test_tick_interval() {
        let progress = FrameProgress::new("test", 25, 10);
        assert!(progress.tick(0).is_none());
        assert!(progress.tick(5).is_none());
        assert!(progress.tick(10).is_some());
        assert!(progress.tick(25).is_some());
    }
}
