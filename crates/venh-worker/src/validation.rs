//! Job input validation.
//!
//! Turns the untyped `input` object of a job document into a [`JobInput`].
//! Absent (or `null`) optional fields take their defaults; present fields
//! with a wrong type or an out-of-range value are rejected, never replaced.

use serde_json::{Map, Value};
use thiserror::Error;
use venh_models::job::{is_valid_weight, DEFAULT_ENHANCER_WEIGHT, DEFAULT_USE_FACEID};
use venh_models::{EnhancerKind, EnhancerParseError, GpenVariant, GpenVariantParseError, JobInput};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("input must be a JSON object")]
    NotAnObject,

    #[error("video_url is required")]
    MissingVideoUrl,

    #[error("{field} must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error(transparent)]
    UnknownEnhancer(#[from] EnhancerParseError),

    #[error("enhancer_w must be between 0 and 1, got {0}")]
    WeightOutOfRange(f64),

    #[error(transparent)]
    UnknownGpenType(#[from] GpenVariantParseError),

    #[error("{0}")]
    InvalidConfig(String),
}

/// Validate a job's `input` object.
pub fn validate_input(input: &Value) -> Result<JobInput, ValidationError> {
    let obj = input.as_object().ok_or(ValidationError::NotAnObject)?;

    let video_url = match field(obj, "video_url") {
        None => return Err(ValidationError::MissingVideoUrl),
        Some(Value::String(s)) if s.trim().is_empty() => {
            return Err(ValidationError::MissingVideoUrl)
        }
        Some(Value::String(s)) => s.trim().to_string(),
        Some(_) => {
            return Err(ValidationError::WrongType {
                field: "video_url",
                expected: "a string",
            })
        }
    };

    let enhancer = match field(obj, "enhancer") {
        None => EnhancerKind::default(),
        Some(Value::String(s)) => s.parse::<EnhancerKind>()?,
        Some(_) => {
            return Err(ValidationError::WrongType {
                field: "enhancer",
                expected: "a string",
            })
        }
    };

    let use_faceid = match field(obj, "use_faceid") {
        None => DEFAULT_USE_FACEID,
        Some(Value::Bool(b)) => *b,
        Some(_) => {
            return Err(ValidationError::WrongType {
                field: "use_faceid",
                expected: "a boolean",
            })
        }
    };

    let enhancer_w = match field(obj, "enhancer_w") {
        None => DEFAULT_ENHANCER_WEIGHT,
        Some(value) => parse_weight(value)?,
    };

    let gpen_type = match field(obj, "gpen_type") {
        None => GpenVariant::default(),
        Some(Value::String(s)) => s.trim().parse::<GpenVariant>()?,
        Some(Value::Number(n)) => n.to_string().parse::<GpenVariant>()?,
        Some(_) => {
            return Err(ValidationError::WrongType {
                field: "gpen_type",
                expected: "\"256\" or \"512\"",
            })
        }
    };

    Ok(JobInput {
        video_url,
        enhancer,
        use_faceid,
        enhancer_w,
        gpen_type,
    })
}

/// Accepts a JSON number or a numeric string.
pub fn parse_weight(value: &Value) -> Result<f32, ValidationError> {
    let wrong_type = ValidationError::WrongType {
        field: "enhancer_w",
        expected: "a number between 0 and 1",
    };
    let w = match value {
        Value::Number(n) => n.as_f64().ok_or(wrong_type)?,
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| wrong_type)?,
        _ => return Err(wrong_type),
    };
    validate_weight(w)
}

pub fn validate_weight(w: f64) -> Result<f32, ValidationError> {
    if !is_valid_weight(w as f32) || !(0.0..=1.0).contains(&w) {
        return Err(ValidationError::WeightOutOfRange(w));
    }
    Ok(w as f32)
}

fn field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    obj.get(key).filter(|v| !v.is_null())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_defaults_applied() {
        let input = validate_input(&json!({ "video_url": "https://x.test/a.mp4" })).unwrap();
        assert_eq!(input, JobInput::new("https://x.test/a.mp4"));
    }

    #[test]
    fn test_all_fields() {
        let input = validate_input(&json!({
            "video_url": " https://x.test/a.mp4 ",
            "enhancer": "GPEN",
            "use_faceid": false,
            "enhancer_w": 0.8,
            "gpen_type": "512"
        }))
        .unwrap();
        assert_eq!(input.video_url, "https://x.test/a.mp4");
        assert_eq!(input.enhancer, EnhancerKind::Gpen);
        assert!(!input.use_faceid);
        assert!((input.enhancer_w - 0.8).abs() < 1e-6);
        assert_eq!(input.gpen_type, GpenVariant::R512);
    }

    #[test]
    fn test_missing_video_url() {
        assert_eq!(
            validate_input(&json!({ "enhancer": "GFPGAN" })).unwrap_err(),
            ValidationError::MissingVideoUrl
        );
        assert_eq!(
            validate_input(&json!({ "video_url": "   " })).unwrap_err(),
            ValidationError::MissingVideoUrl
        );
        assert_eq!(
            validate_input(&json!({ "video_url": null })).unwrap_err(),
            ValidationError::MissingVideoUrl
        );
    }

    #[test]
    fn test_weight_out_of_range_is_rejected() {
        let err = validate_input(&json!({ "video_url": "u", "enhancer_w": 1.5 })).unwrap_err();
        assert_eq!(err, ValidationError::WeightOutOfRange(1.5));
        assert!(err.to_string().contains("between 0 and 1"));

        assert_err!(validate_input(&json!({ "video_url": "u", "enhancer_w": -0.1 })));
    }

    #[test]
    fn test_weight_bounds_and_strings() {
        for w in [0.0, 1.0] {
            let input = assert_ok!(validate_input(&json!({ "video_url": "u", "enhancer_w": w })));
            assert_eq!(input.enhancer_w as f64, w);
        }
        let input = validate_input(&json!({ "video_url": "u", "enhancer_w": "0.25" })).unwrap();
        assert_eq!(input.enhancer_w, 0.25);

        let err = validate_input(&json!({ "video_url": "u", "enhancer_w": "strong" })).unwrap_err();
        assert!(matches!(err, ValidationError::WrongType { field: "enhancer_w", .. }));
    }

    #[test]
    fn test_unknown_enhancer_lists_options() {
        let err = validate_input(&json!({ "video_url": "u", "enhancer": "SuperRes" })).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("SuperRes"));
        assert!(msg.contains("GFPGAN"));
        assert!(msg.contains("Restoreformer16"));
    }

    #[test]
    fn test_wrong_types() {
        let err = validate_input(&json!({ "video_url": "u", "use_faceid": "yes" })).unwrap_err();
        assert!(matches!(err, ValidationError::WrongType { field: "use_faceid", .. }));

        let err = validate_input(&json!({ "video_url": 42 })).unwrap_err();
        assert!(matches!(err, ValidationError::WrongType { field: "video_url", .. }));

        let err = validate_input(&json!({ "video_url": "u", "enhancer": 3 })).unwrap_err();
        assert!(matches!(err, ValidationError::WrongType { field: "enhancer", .. }));

        assert_eq!(
            validate_input(&json!(["video_url"])).unwrap_err(),
            ValidationError::NotAnObject
        );
    }

    #[test]
    fn test_gpen_type_number_or_string() {
        let input = assert_ok!(validate_input(&json!({ "video_url": "u", "gpen_type": 512 })));
        assert_eq!(input.gpen_type, GpenVariant::R512);
        assert_err!(validate_input(&json!({ "video_url": "u", "gpen_type": "1024" })));
    }
}
