use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::RunConfig;
use crate::error::{JobError, ScanError};
use crate::job::{ArchiveJob, JobOutcome};
use crate::progress::{JobId, ProgressHub, ProgressObserver};
use crate::scan::scan_archives;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Completed,
    Failed,
}

/// What happened to one archive.
#[derive(Clone, Debug, Serialize)]
pub struct JobReport {
    pub id: JobId,
    pub archive: PathBuf,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub bytes_extracted: u64,
    pub files_routed: u64,
    pub archive_removed: bool,
    pub elapsed_ms: u64,
}

impl JobReport {
    fn new(id: JobId, archive: PathBuf, outcome: JobOutcome, elapsed: Duration) -> Self {
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        match outcome {
            JobOutcome::Completed {
                extract,
                routed,
                archive_removed,
            } => Self {
                id,
                archive,
                status: JobStatus::Completed,
                error_kind: None,
                error: None,
                bytes_extracted: extract.bytes_extracted,
                files_routed: routed.files,
                archive_removed,
                elapsed_ms,
            },
            JobOutcome::Failed(error) => Self {
                id,
                archive,
                status: JobStatus::Failed,
                error_kind: Some(error.kind()),
                error: Some(error.to_string()),
                bytes_extracted: 0,
                files_routed: 0,
                archive_removed: false,
                elapsed_ms,
            },
        }
    }
}

/// Per-archive reports of one run, in discovery order.
#[derive(Clone, Debug, Default, Serialize)]
pub struct RunSummary {
    pub jobs: Vec<JobReport>,
    pub elapsed_ms: u64,
}

impl RunSummary {
    pub fn completed(&self) -> usize {
        self.jobs
            .iter()
            .filter(|r| r.status == JobStatus::Completed)
            .count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &JobReport> {
        self.jobs.iter().filter(|r| r.status == JobStatus::Failed)
    }
}

/// Bounded pool running one [`ArchiveJob`] per archive.
///
/// Archives are dispatched in the order given; a slot is taken before each
/// dispatch, so at most `jobs` archives are in flight. Each job runs on the
/// blocking pool and holds its slot until its workspace is gone.
pub struct Orchestrator {
    config: Arc<RunConfig>,
    hub: Arc<ProgressHub>,
}

impl Orchestrator {
    pub fn new(config: RunConfig) -> Self {
        Self {
            config: Arc::new(config),
            hub: Arc::new(ProgressHub::default()),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.hub = Arc::new(ProgressHub::new(Some(observer)));
        self
    }

    pub fn hub(&self) -> &Arc<ProgressHub> {
        &self.hub
    }

    /// Run every archive and wait for all of them. Individual failures are
    /// recorded in the summary; this never fails as a whole.
    pub async fn run(&self, archives: Vec<PathBuf>) -> RunSummary {
        let started = Instant::now();
        let slots = Arc::new(Semaphore::new(self.config.jobs.max(1)));
        self.hub.begin_run(archives.len() as u64);
        tracing::info!(
            archives = archives.len(),
            jobs = self.config.jobs,
            "run started"
        );

        let mut workers = JoinSet::new();
        for (index, archive) in archives.into_iter().enumerate() {
            let Ok(permit) = slots.clone().acquire_owned().await else {
                break;
            };
            let job = ArchiveJob::new(
                JobId(index),
                archive,
                self.config.clone(),
                self.hub.clone(),
            );
            let hub = self.hub.clone();

            workers.spawn_blocking(move || {
                let _permit = permit;
                let started = Instant::now();
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| job.run()))
                    .unwrap_or_else(|payload| {
                        let message = panic_message(payload.as_ref());
                        tracing::error!(
                            job = %job.id(),
                            archive = %job.archive().display(),
                            panic = %message,
                            "worker panicked"
                        );
                        hub.finish_job(job.id(), false);
                        JobOutcome::Failed(JobError::Panicked(message))
                    });
                JobReport::new(
                    job.id(),
                    job.archive().to_path_buf(),
                    outcome,
                    started.elapsed(),
                )
            });
        }

        let mut jobs = Vec::new();
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(report) => jobs.push(report),
                Err(e) => tracing::error!(error = %e, "worker task lost"),
            }
        }
        jobs.sort_by_key(|r| r.id);
        self.hub.end_run();

        let summary = RunSummary {
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            jobs,
        };
        tracing::info!(
            completed = summary.completed(),
            failed = summary.failed().count(),
            "run finished"
        );
        summary
    }
}

/// Scan `root` and run every archive found. Only a failed scan is an error.
pub async fn process_archives(
    root: impl AsRef<Path>,
    config: RunConfig,
    observer: Option<Arc<dyn ProgressObserver>>,
) -> Result<RunSummary, ScanError> {
    let archives = scan_archives(root)?;
    let mut orchestrator = Orchestrator::new(config);
    if let Some(observer) = observer {
        orchestrator = orchestrator.with_observer(observer);
    }
    Ok(orchestrator.run(archives).await)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
