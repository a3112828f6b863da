//! Enhancer kinds and model variants.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Available face enhancement models.
///
/// Wire names are exact and case-sensitive (`"GFPGAN"`, `"Codeformer"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
pub enum EnhancerKind {
    #[default]
    #[serde(rename = "GFPGAN")]
    Gfpgan,
    #[serde(rename = "Codeformer")]
    Codeformer,
    #[serde(rename = "GPEN")]
    Gpen,
    #[serde(rename = "RealESRGAN")]
    RealEsrgan,
    #[serde(rename = "Restoreformer")]
    Restoreformer,
    #[serde(rename = "Restoreformer32")]
    Restoreformer32,
    #[serde(rename = "Restoreformer16")]
    Restoreformer16,
}

impl EnhancerKind {
    /// All available enhancers, in the order they are listed to users.
    pub const ALL: &'static [EnhancerKind] = &[
        EnhancerKind::Gfpgan,
        EnhancerKind::Codeformer,
        EnhancerKind::Gpen,
        EnhancerKind::RealEsrgan,
        EnhancerKind::Restoreformer,
        EnhancerKind::Restoreformer32,
        EnhancerKind::Restoreformer16,
    ];

    /// Returns the wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            EnhancerKind::Gfpgan => "GFPGAN",
            EnhancerKind::Codeformer => "Codeformer",
            EnhancerKind::Gpen => "GPEN",
            EnhancerKind::RealEsrgan => "RealESRGAN",
            EnhancerKind::Restoreformer => "Restoreformer",
            EnhancerKind::Restoreformer32 => "Restoreformer32",
            EnhancerKind::Restoreformer16 => "Restoreformer16",
        }
    }

    /// Model file, relative to the model directory.
    pub fn model_file(&self, gpen: GpenVariant) -> String {
        match self {
            EnhancerKind::Gfpgan => "GFPGAN/GFPGANv1.4.onnx".to_string(),
            EnhancerKind::Codeformer => "Codeformer/codeformer.onnx".to_string(),
            EnhancerKind::Gpen => format!("GPEN/GPEN-BFR-{}.onnx", gpen.as_str()),
            EnhancerKind::RealEsrgan => "RealEsrgan/RealESRGAN_x2plus.onnx".to_string(),
            EnhancerKind::Restoreformer => "restoreformer/restoreformer.onnx".to_string(),
            EnhancerKind::Restoreformer32 => "restoreformer/restoreformer32.onnx".to_string(),
            EnhancerKind::Restoreformer16 => "restoreformer/restoreformer16.onnx".to_string(),
        }
    }

    /// Whether the model blends its output using the enhancer weight.
    pub fn uses_weight(&self) -> bool {
        matches!(self, EnhancerKind::Gfpgan | EnhancerKind::Codeformer)
    }

    /// Comma-separated list of valid names, for error messages.
    pub fn valid_names() -> String {
        Self::ALL
            .iter()
            .map(|k| k.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for EnhancerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EnhancerKind {
    type Err = EnhancerParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| EnhancerParseError(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown enhancer: {0}. Valid options: {valid}", valid = EnhancerKind::valid_names())]
pub struct EnhancerParseError(pub String);

/// GPEN model resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
pub enum GpenVariant {
    #[default]
    #[serde(rename = "256")]
    R256,
    #[serde(rename = "512")]
    R512,
}

impl GpenVariant {
    pub const ALL: &'static [GpenVariant] = &[GpenVariant::R256, GpenVariant::R512];

    pub fn as_str(&self) -> &'static str {
        match self {
            GpenVariant::R256 => "256",
            GpenVariant::R512 => "512",
        }
    }
}

impl fmt::Display for GpenVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for GpenVariant {
    type Err = GpenVariantParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "256" => Ok(GpenVariant::R256),
            "512" => Ok(GpenVariant::R512),
            _ => Err(GpenVariantParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown GPEN type: {0}. Valid options: 256, 512")]
pub struct GpenVariantParseError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enhancer_parse() {
        assert_eq!("GFPGAN".parse::<EnhancerKind>().unwrap(), EnhancerKind::Gfpgan);
        assert_eq!(
            "Restoreformer16".parse::<EnhancerKind>().unwrap(),
            EnhancerKind::Restoreformer16
        );
        assert!("gfpgan".parse::<EnhancerKind>().is_err());
    }

    #[test]
    fn test_unknown_enhancer_lists_options() {
        let err = "Magic".parse::<EnhancerKind>().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Magic"));
        for kind in EnhancerKind::ALL {
            assert!(msg.contains(kind.as_str()), "missing {} in {}", kind, msg);
        }
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_string(&EnhancerKind::RealEsrgan).unwrap();
        assert_eq!(json, "\"RealESRGAN\"");
        let kind: EnhancerKind = serde_json::from_str("\"Codeformer\"").unwrap();
        assert_eq!(kind, EnhancerKind::Codeformer);
    }

    #[test]
    fn test_gpen_model_file() {
        assert_eq!(
            EnhancerKind::Gpen.model_file(GpenVariant::R512),
            "GPEN/GPEN-BFR-512.onnx"
        );
        assert_eq!(
            EnhancerKind::Gfpgan.model_file(GpenVariant::R512),
            "GFPGAN/GFPGANv1.4.onnx"
        );
    }

    #[test]
    fn test_gpen_variant_parse() {
        assert_eq!("256".parse::<GpenVariant>().unwrap(), GpenVariant::R256);
        assert!("1024".parse::<GpenVariant>().is_err());
    }
}
