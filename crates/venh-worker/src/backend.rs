//! Enhancer backends.
//!
//! A backend turns an [`EnhancerSpec`] into the frame transforms the
//! pipeline runs. Model inference lives behind this seam; the shipped
//! [`PassthroughBackend`] resolves and optionally checks the model files but
//! leaves frames unchanged.

use std::path::{Path, PathBuf};
use tracing::info;
use venh_media::{FrameEnhancer, IdentitySelector, KeepEnhancedSelector, PassthroughEnhancer};
use venh_models::{EnhancementJobConfig, EnhancerKind, GpenVariant};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};

/// Everything a backend needs to build the transforms for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct EnhancerSpec {
    pub kind: EnhancerKind,
    pub weight: f32,
    pub gpen_variant: GpenVariant,
    pub model_path: PathBuf,
    /// Identity model, present when identity selection is requested.
    pub identity_model: Option<PathBuf>,
}

/// Transforms built for one run.
pub struct TransformSet {
    pub enhancer: Box<dyn FrameEnhancer>,
    pub selector: Option<Box<dyn IdentitySelector>>,
}

/// Builds frame transforms from a spec.
pub trait EnhancerBackend: Send + Sync {
    fn name(&self) -> &str;

    fn build(&self, spec: &EnhancerSpec) -> WorkerResult<TransformSet>;
}

/// Resolves model file locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCatalog {
    model_dir: PathBuf,
    identity_model: PathBuf,
}

impl ModelCatalog {
    pub fn new(model_dir: impl Into<PathBuf>, identity_model: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
            identity_model: identity_model.into(),
        }
    }

    pub fn from_config(config: &WorkerConfig) -> Self {
        Self::new(&config.model_dir, &config.faceid_model)
    }

    pub fn model_path(&self, kind: EnhancerKind, gpen: GpenVariant) -> PathBuf {
        self.model_dir.join(kind.model_file(gpen))
    }

    pub fn identity_model(&self) -> &Path {
        &self.identity_model
    }

    pub fn spec_for(&self, job: &EnhancementJobConfig) -> EnhancerSpec {
        EnhancerSpec {
            kind: job.enhancer,
            weight: job.enhancer_weight,
            gpen_variant: job.gpen_variant,
            model_path: self.model_path(job.enhancer, job.gpen_variant),
            identity_model: job
                .identity_selection
                .then(|| self.identity_model.clone()),
        }
    }

    /// Check that every model file named in `spec` exists.
    pub fn require_files(spec: &EnhancerSpec) -> WorkerResult<()> {
        let paths = std::iter::once(&spec.model_path).chain(spec.identity_model.as_ref());
        for path in paths {
            if !path.is_file() {
                return Err(WorkerError::ModelNotFound(path.clone()));
            }
        }
        Ok(())
    }
}

/// Identity transforms; frames pass through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughBackend {
    require_models: bool,
}

impl PassthroughBackend {
    pub fn new(require_models: bool) -> Self {
        Self { require_models }
    }
}

impl EnhancerBackend for PassthroughBackend {
    fn name(&self) -> &str {
        "passthrough"
    }

    fn build(&self, spec: &EnhancerSpec) -> WorkerResult<TransformSet> {
        if self.require_models {
            ModelCatalog::require_files(spec)?;
        }

        let weight = if spec.kind.uses_weight() { spec.weight } else { 1.0 };
        info!(
            enhancer = spec.kind.as_str(),
            model = %spec.model_path.display(),
            weight,
            identity_model = ?spec.identity_model,
            "Loaded passthrough enhancer"
        );

        let selector: Option<Box<dyn IdentitySelector>> = spec
            .identity_model
            .as_ref()
            .map(|_| Box::new(KeepEnhancedSelector) as Box<dyn IdentitySelector>);

        Ok(TransformSet {
            enhancer: Box::new(PassthroughEnhancer::new(spec.kind.as_str())),
            selector,
        })
    }
}
