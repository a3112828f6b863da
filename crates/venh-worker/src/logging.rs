//! Job-scoped logging and subscriber setup.
//!
//! Every event a [`JobLogger`] emits carries `job_id` and `operation` fields,
//! so a single job can be followed through JSON logs with one filter.

use tracing::{error, info, warn, Span};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use venh_models::JobId;

/// Emits events tagged with one job's id and operation.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job: String,
    op: String,
}

impl JobLogger {
    /// `operation` names the kind of run, e.g. `enhance_job` or `enhance_cli`.
    pub fn new(job_id: &JobId, operation: &str) -> Self {
        Self {
            job: job_id.as_str().to_owned(),
            op: operation.to_owned(),
        }
    }

    pub fn log_start(&self, detail: &str) {
        info!(job_id = %self.job, operation = %self.op, stage = "start", "{}", detail);
    }

    pub fn log_progress(&self, detail: &str) {
        info!(job_id = %self.job, operation = %self.op, stage = "progress", "{}", detail);
    }

    pub fn log_warning(&self, detail: &str) {
        warn!(job_id = %self.job, operation = %self.op, "{}", detail);
    }

    pub fn log_error(&self, detail: &str) {
        error!(job_id = %self.job, operation = %self.op, "Job failed: {}", detail);
    }

    pub fn log_completion(&self, detail: &str) {
        info!(job_id = %self.job, operation = %self.op, stage = "done", "Job finished: {}", detail);
    }

    pub fn job_id(&self) -> &str {
        &self.job
    }

    pub fn operation(&self) -> &str {
        &self.op
    }

    /// Span wrapping everything the job does, including library events.
    pub fn create_span(&self) -> Span {
        tracing::info_span!("enhance", job_id = %self.job, operation = %self.op)
    }
}

/// Install the global subscriber on stderr, keeping stdout free for job
/// results. `LOG_FORMAT=json` selects JSON lines; `RUST_LOG` directives are
/// added on top of the crate defaults. A second call is a no-op.
pub fn init_tracing() {
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let filter = ["venh=info", "venh_media=info", "venh_worker=info"]
        .into_iter()
        .filter_map(|d| d.parse::<Directive>().ok())
        .fold(EnvFilter::from_default_env(), |f, d| f.add_directive(d));

    let result = if json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(filter)
            .try_init()
    };
    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
