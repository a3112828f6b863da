//! Scoped temporary files.
//!
//! Every intermediate file a job creates is registered here before it is
//! written, and removed exactly once when the set is released or dropped.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Outcome of releasing a [`TempResourceSet`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: Vec<PathBuf>,
    /// Paths that did not exist at release time.
    pub already_absent: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Ordered set of temporary paths owned by one job.
#[derive(Debug)]
pub struct TempResourceSet {
    root: PathBuf,
    scope: String,
    paths: Vec<PathBuf>,
    released: bool,
}

impl TempResourceSet {
    /// `scope` distinguishes concurrent jobs sharing one `root`. Characters
    /// outside `[A-Za-z0-9_-]` are replaced, so a scope can never leave `root`.
    pub fn new(root: impl Into<PathBuf>, scope: impl AsRef<str>) -> Self {
        Self {
            root: root.into(),
            scope: sanitize_component(scope.as_ref()),
            paths: Vec::new(),
            released: false,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Reserve `<root>/<stem>_<scope><.ext>` and register it. Nothing is
    /// created on disk.
    pub fn allocate(&mut self, name: &str) -> PathBuf {
        let name = Path::new(name);
        let stem = sanitize_component(&name.file_stem().unwrap_or_default().to_string_lossy());
        let file_name = match name.extension() {
            Some(ext) => format!(
                "{}_{}.{}",
                stem,
                self.scope,
                sanitize_component(&ext.to_string_lossy())
            ),
            None => format!("{}_{}", stem, self.scope),
        };
        let path = self.root.join(file_name);
        debug_assert_eq!(path.parent(), Some(self.root.as_path()));
        self.track(path.clone());
        path
    }

    /// Register an existing path for removal.
    pub fn track(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if !self.paths.contains(&path) {
            debug!(scope = %self.scope, path = %path.display(), "Tracking temp file");
            self.paths.push(path);
        }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Delete every tracked path in registration order. Failures are logged,
    /// never returned. Calling this again is a no-op.
    pub fn release(&mut self) -> CleanupReport {
        let mut report = CleanupReport::default();
        if self.released {
            return report;
        }
        self.released = true;

        for path in self.paths.drain(..) {
            match std::fs::remove_file(&path) {
                Ok(()) => report.removed.push(path),
                Err(e) if e.kind() == ErrorKind::NotFound => report.already_absent.push(path),
                Err(e) => {
                    warn!(
                        scope = %self.scope,
                        path = %path.display(),
                        "Failed to remove temp file: {}",
                        e
                    );
                    report.failed.push((path, e.to_string()));
                }
            }
        }

        debug!(
            scope = %self.scope,
            removed = report.removed.len(),
            absent = report.already_absent.len(),
            failed = report.failed.len(),
            "Released temp files"
        );
        report
    }
}

/// Map `raw` onto a single safe file name component.
fn sanitize_component(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "tmp".to_string()
    } else {
        cleaned
    }
}

impl Drop for TempResourceSet {
    fn drop(&mut self) {
        if !self.released {
            self.release();
        }
    }
}
