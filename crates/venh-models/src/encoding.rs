//! Encoding profiles for the intermediate and final video.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Lossless codec for the silent intermediate video.
pub const INTERMEDIATE_CODEC: &str = "ffv1";
/// Raw pixel layout exchanged with the frame transforms.
pub const RAW_PIXEL_FORMAT: &str = "bgr24";
/// Default codec for the delivered video.
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default codec for the reattached audio.
pub const DEFAULT_AUDIO_CODEC: &str = "aac";

/// Encoding of the silent video written by the frame loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct IntermediateProfile {
    #[serde(default = "default_intermediate_codec")]
    pub codec: String,
    #[serde(default = "default_pix_fmt")]
    pub pix_fmt: String,
}

fn default_intermediate_codec() -> String {
    INTERMEDIATE_CODEC.to_string()
}
fn default_pix_fmt() -> String {
    RAW_PIXEL_FORMAT.to_string()
}

impl Default for IntermediateProfile {
    fn default() -> Self {
        Self {
            codec: INTERMEDIATE_CODEC.to_string(),
            pix_fmt: RAW_PIXEL_FORMAT.to_string(),
        }
    }
}

impl IntermediateProfile {
    /// Output arguments: video only, no audio track.
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        vec!["-an".to_string(), "-c:v".to_string(), self.codec.clone()]
    }
}

/// Encoding of the final remuxed artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RemuxEncoding {
    #[serde(default = "default_video_codec")]
    pub video_codec: String,
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,
    /// Stop at the end of the shorter stream.
    #[serde(default = "default_true")]
    pub shortest: bool,
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_video_codec() -> String {
    DEFAULT_VIDEO_CODEC.to_string()
}
fn default_audio_codec() -> String {
    DEFAULT_AUDIO_CODEC.to_string()
}
fn default_true() -> bool {
    true
}

impl Default for RemuxEncoding {
    fn default() -> Self {
        Self {
            video_codec: DEFAULT_VIDEO_CODEC.to_string(),
            audio_codec: DEFAULT_AUDIO_CODEC.to_string(),
            shortest: true,
            extra_args: Vec::new(),
        }
    }
}

impl RemuxEncoding {
    /// Output arguments for two inputs: video from input 0, audio (if any)
    /// from input 1.
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        let mut args = vec![
            "-map".to_string(),
            "0:v:0".to_string(),
            "-map".to_string(),
            "1:a:0?".to_string(),
            "-c:v".to_string(),
            self.video_codec.clone(),
            "-c:a".to_string(),
            self.audio_codec.clone(),
        ];
        if self.shortest {
            args.push("-shortest".to_string());
        }
        args.extend(self.extra_args.clone());
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intermediate_has_no_audio() {
        let args = IntermediateProfile::default().to_ffmpeg_args();
        assert!(args.contains(&"-an".to_string()));
        assert!(args.contains(&"ffv1".to_string()));
    }

    #[test]
    fn test_remux_args() {
        let args = RemuxEncoding::default().to_ffmpeg_args();
        assert!(args.windows(2).any(|w| w[0] == "-c:v" && w[1] == "libx264"));
        assert!(args.windows(2).any(|w| w[0] == "-c:a" && w[1] == "aac"));
        assert!(args.windows(2).any(|w| w[0] == "-map" && w[1] == "1:a:0?"));
        assert_eq!(args.last().map(String::as_str), Some("-shortest"));
    }
}
