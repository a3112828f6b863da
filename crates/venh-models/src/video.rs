//! Video metadata models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Frame rate as a rational number, e.g. `30000/1001`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct FrameRate {
    pub num: u32,
    pub den: u32,
}

impl FrameRate {
    pub fn new(num: u32, den: u32) -> Self {
        Self { num, den }
    }

    /// Whole frames per second.
    pub fn from_integer(fps: u32) -> Self {
        Self { num: fps, den: 1 }
    }

    pub fn as_f64(&self) -> f64 {
        if self.den == 0 {
            return 0.0;
        }
        self.num as f64 / self.den as f64
    }

    pub fn is_positive(&self) -> bool {
        self.num > 0 && self.den > 0
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid frame rate: {0}")]
pub struct FrameRateParseError(pub String);

impl FromStr for FrameRate {
    type Err = FrameRateParseError;

    /// Parses `"30/1"` or `"25"`. Zero rates parse; callers check `is_positive`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || FrameRateParseError(s.to_string());
        let s = s.trim();
        match s.split_once('/') {
            Some((num, den)) => {
                let num = num.trim().parse::<u32>().map_err(|_| err())?;
                let den = den.trim().parse::<u32>().map_err(|_| err())?;
                Ok(Self { num, den })
            }
            None => {
                let num = s.parse::<u32>().map_err(|_| err())?;
                Ok(Self { num, den: 1 })
            }
        }
    }
}

/// Properties of a source video, read once by the probe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VideoMetadata {
    pub frame_rate: FrameRate,
    pub width: u32,
    pub height: u32,
    /// Number of frames reported by the container. May be 0 when unknown.
    pub frame_count: u64,
}

impl VideoMetadata {
    pub fn new(frame_rate: FrameRate, width: u32, height: u32, frame_count: u64) -> Self {
        Self {
            frame_rate,
            width,
            height,
            frame_count,
        }
    }

    /// Bytes in one packed 3-channel frame.
    pub fn frame_size(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }

    /// Validate the metadata.
    pub fn validate(&self) -> Result<(), String> {
        if !self.frame_rate.is_positive() {
            return Err(format!("frame rate must be positive, got {}", self.frame_rate));
        }
        if self.width == 0 || self.height == 0 {
            return Err(format!(
                "dimensions must be positive, got {}x{}",
                self.width, self.height
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame_rate() {
        assert_eq!("30/1".parse::<FrameRate>().unwrap(), FrameRate::new(30, 1));
        assert_eq!("25".parse::<FrameRate>().unwrap(), FrameRate::new(25, 1));
        let ntsc: FrameRate = "30000/1001".parse().unwrap();
        assert!((ntsc.as_f64() - 29.97).abs() < 0.01);
        assert!("abc".parse::<FrameRate>().is_err());
        assert!(!"0/0".parse::<FrameRate>().unwrap().is_positive());
    }

    #[test]
    fn test_metadata_validate() {
        let meta = VideoMetadata::new(FrameRate::from_integer(30), 640, 480, 10);
        assert!(meta.validate().is_ok());
        assert_eq!(meta.frame_size(), 640 * 480 * 3);

        let bad_rate = VideoMetadata::new(FrameRate::new(0, 1), 640, 480, 10);
        assert!(bad_rate.validate().is_err());

        let bad_dims = VideoMetadata::new(FrameRate::from_integer(30), 0, 480, 10);
        assert!(bad_dims.validate().is_err());

        let unknown_count = VideoMetadata::new(FrameRate::from_integer(30), 640, 480, 0);
        assert!(unknown_count.validate().is_ok());
    }
}
