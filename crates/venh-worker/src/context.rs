//! Per-job context.

use venh_media::{CleanupReport, TempResourceSet};
use venh_models::JobId;

use crate::config::{JobLimits, WorkerConfig};
use crate::logging::JobLogger;

/// State owned by one job from validation to cleanup.
#[derive(Debug)]
pub struct JobContext {
    pub job_id: JobId,
    pub logger: JobLogger,
    pub limits: JobLimits,
    pub temp: TempResourceSet,
}

impl JobContext {
    pub fn new(job_id: JobId, operation: &str, config: &WorkerConfig) -> Self {
        let logger = JobLogger::new(&job_id, operation);
        let temp = TempResourceSet::new(&config.work_dir, job_id.temp_scope());
        Self {
            job_id,
            logger,
            limits: config.limits,
            temp,
        }
    }

    /// Remove every temp file the job created.
    pub fn release(&mut self) -> CleanupReport {
        let report = self.temp.release();
        if !report.is_clean() {
            self.logger.log_warning(&format!(
                "{} temp file(s) could not be removed",
                report.failed.len()
            ));
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_scoped_by_job() {
        let dir = tempfile::tempdir().unwrap();
        let config = WorkerConfig::default().with_work_dir(dir.path());
        let mut ctx = JobContext::new(JobId::from_string("job-7"), "test", &config);

        let path = ctx.temp.allocate("silent.mkv");
        assert_eq!(path.parent(), Some(dir.path()));
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("silent_job-7_") && name.ends_with(".mkv"), "{}", name);
        std::fs::write(&path, b"x").unwrap();

        let report = ctx.release();
        assert_eq!(report.removed, vec![path.clone()]);
        assert!(!path.exists());
    }

    #[test]
    fn test_same_job_id_never_shares_temp_paths() {
        let base = tempfile::tempdir().unwrap();
        let work = base.path().join("work");
        std::fs::create_dir_all(work.join("input_video_a")).unwrap();
        let victim = base.path().join("victim.mp4");
        std::fs::write(&victim, b"keep").unwrap();
        let config = WorkerConfig::default().with_work_dir(&work);

        let id = JobId::from_string("a/../../victim");
        let mut first = JobContext::new(id.clone(), "test", &config);
        let mut second = JobContext::new(id, "test", &config);
        let a = first.temp.allocate("input_video.mp4");
        let b = second.temp.allocate("input_video.mp4");

        assert_ne!(a, b);
        assert_eq!(a.parent(), Some(work.as_path()));
        assert_eq!(b.parent(), Some(work.as_path()));

        std::fs::write(&a, b"first").unwrap();
        std::fs::write(&b, b"second").unwrap();
        first.release();
        assert!(b.exists(), "releasing one run removed the other's file");
        drop(second);
        assert!(!b.exists());
        assert!(victim.exists());
    }
}
