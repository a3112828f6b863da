//! Per-frame transform capabilities.
//!
//! An enhancer maps one frame to an enhanced frame of the same shape. An
//! identity selector decides, given the original and the enhanced frame,
//! which one (or what blend) preserves the subject's identity. Both may fail
//! per frame; the pipeline recovers from either.

use thiserror::Error;

use crate::frame::Frame;

/// A per-frame transform failure. Never fatal for the job.
#[derive(Debug, Clone, Error)]
pub enum TransformError {
    #[error("no face detected")]
    NoFace,

    #[error("model inference failed: {0}")]
    Inference(String),

    #[error("{0}")]
    Other(String),
}

impl TransformError {
    pub fn inference(message: impl Into<String>) -> Self {
        Self::Inference(message.into())
    }
}

/// Enhances a single frame.
pub trait FrameEnhancer: Send {
    fn name(&self) -> &str;

    fn enhance(&mut self, frame: &Frame) -> Result<Frame, TransformError>;
}

/// Picks the identity-consistent frame.
pub trait IdentitySelector: Send {
    fn select(
        &mut self,
        original: &Frame,
        transformed: &Frame,
        reference: &Frame,
    ) -> Result<Frame, TransformError>;
}

impl<T: FrameEnhancer + ?Sized> FrameEnhancer for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn enhance(&mut self, frame: &Frame) -> Result<Frame, TransformError> {
        (**self).enhance(frame)
    }
}

impl<T: IdentitySelector + ?Sized> IdentitySelector for Box<T> {
    fn select(
        &mut self,
        original: &Frame,
        transformed: &Frame,
        reference: &Frame,
    ) -> Result<Frame, TransformError> {
        (**self).select(original, transformed, reference)
    }
}

/// Returns every frame unchanged.
#[derive(Debug, Clone, Default)]
pub struct PassthroughEnhancer {
    label: String,
}

impl PassthroughEnhancer {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl FrameEnhancer for PassthroughEnhancer {
    fn name(&self) -> &str {
        if self.label.is_empty() {
            "passthrough"
        } else {
            &self.label
        }
    }

    fn enhance(&mut self, frame: &Frame) -> Result<Frame, TransformError> {
        Ok(frame.clone())
    }
}

/// Always keeps the transformed frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepEnhancedSelector;

impl IdentitySelector for KeepEnhancedSelector {
    fn select(
        &mut self,
        _original: &Frame,
        transformed: &Frame,
        _reference: &Frame,
    ) -> Result<Frame, TransformError> {
        Ok(transformed.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough() {
        let mut enhancer = PassthroughEnhancer::new("GFPGAN");
        let frame = Frame::filled(2, 2, 3, 9);
        assert_eq!(enhancer.enhance(&frame).unwrap(), frame);
        assert_eq!(enhancer.name(), "GFPGAN");
        assert_eq!(PassthroughEnhancer::default().name(), "passthrough");
    }

    #[test]
    fn test_boxed_selector() {
        let mut selector: Box<dyn IdentitySelector> = Box::new(KeepEnhancedSelector);
        let a = Frame::filled(2, 2, 0, 1);
        let b = Frame::filled(2, 2, 0, 2);
        assert_eq!(selector.select(&a, &b, &a).unwrap(), b);
    }
}
