//! Run-wide progress state shared by concurrent jobs.
//!
//! A [`ProgressHub`] is created per run and handed to every job. It tracks
//! three channels: archives finished, bytes extracted per job, and files
//! copied per job. Every update goes through one mutex, and each accepted
//! update is forwarded to an optional [`ProgressObserver`] while that lock
//! is held, so observers see the same order the state went through.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;

/// Position of an archive in discovery order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct JobId(pub usize);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct JobProgress {
    pub bytes_extracted: u64,
    pub bytes_total: u64,
    pub files_copied: u64,
    pub files_total: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub jobs_done: u64,
    pub jobs_total: u64,
    /// Jobs registered and not yet finished.
    pub active: BTreeMap<JobId, JobProgress>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProgressEvent {
    RunStarted {
        jobs: u64,
    },
    JobStarted {
        job: JobId,
        archive: PathBuf,
    },
    Extracted {
        job: JobId,
        bytes: u64,
        total: u64,
    },
    Copied {
        job: JobId,
        files: u64,
        total: u64,
    },
    JobFinished {
        job: JobId,
        succeeded: bool,
        done: u64,
        total: u64,
    },
    RunFinished {
        done: u64,
        total: u64,
    },
}

/// Presentation hook. Called with the hub's lock held: keep it cheap and
/// never call back into the hub.
pub trait ProgressObserver: Send + Sync {
    fn on_event(&self, event: &ProgressEvent);
}

#[derive(Default)]
struct State {
    jobs_total: u64,
    jobs_done: u64,
    active: BTreeMap<JobId, JobProgress>,
    finished: HashSet<JobId>,
}

#[derive(Default)]
pub struct ProgressHub {
    state: Mutex<State>,
    observer: Option<Arc<dyn ProgressObserver>>,
}

impl fmt::Debug for ProgressHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressHub")
            .field("snapshot", &self.snapshot())
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl ProgressHub {
    pub fn new(observer: Option<Arc<dyn ProgressObserver>>) -> Self {
        Self {
            state: Mutex::default(),
            observer,
        }
    }

    /// Reset all counters for a run of `jobs` archives.
    pub fn begin_run(&self, jobs: u64) {
        let mut state = self.lock();
        *state = State {
            jobs_total: jobs,
            ..State::default()
        };
        self.emit(&ProgressEvent::RunStarted { jobs });
    }

    pub fn register_job(&self, job: JobId, archive: &Path) {
        let mut state = self.lock();
        if state.finished.contains(&job) {
            return;
        }
        state.active.entry(job).or_default();
        self.emit(&ProgressEvent::JobStarted {
            job,
            archive: archive.to_path_buf(),
        });
    }

    /// Record extraction progress. Values lower than the last recorded ones
    /// are raised to them, so each job's bytes never go backwards.
    pub fn record_extracted(&self, job: JobId, bytes: u64, total: u64) {
        let mut state = self.lock();
        let Some(progress) = state.active.get_mut(&job) else {
            return;
        };
        progress.bytes_extracted = progress.bytes_extracted.max(bytes);
        progress.bytes_total = progress.bytes_total.max(total).max(progress.bytes_extracted);
        let event = ProgressEvent::Extracted {
            job,
            bytes: progress.bytes_extracted,
            total: progress.bytes_total,
        };
        self.emit(&event);
    }

    pub fn record_copied(&self, job: JobId, files: u64, total: u64) {
        let mut state = self.lock();
        let Some(progress) = state.active.get_mut(&job) else {
            return;
        };
        progress.files_copied = progress.files_copied.max(files);
        progress.files_total = progress.files_total.max(total).max(progress.files_copied);
        let event = ProgressEvent::Copied {
            job,
            files: progress.files_copied,
            total: progress.files_total,
        };
        self.emit(&event);
    }

    /// Count `job` as done. Only the first call for a job counts; returns
    /// whether this call did.
    pub fn finish_job(&self, job: JobId, succeeded: bool) -> bool {
        let mut state = self.lock();
        if !state.finished.insert(job) {
            return false;
        }
        state.active.remove(&job);
        state.jobs_done += 1;
        state.jobs_total = state.jobs_total.max(state.jobs_done);
        let event = ProgressEvent::JobFinished {
            job,
            succeeded,
            done: state.jobs_done,
            total: state.jobs_total,
        };
        self.emit(&event);
        true
    }

    pub fn end_run(&self) {
        let state = self.lock();
        self.emit(&ProgressEvent::RunFinished {
            done: state.jobs_done,
            total: state.jobs_total,
        });
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let state = self.lock();
        ProgressSnapshot {
            jobs_done: state.jobs_done,
            jobs_total: state.jobs_total,
            active: state.active.clone(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: &ProgressEvent) {
        if let Some(observer) = &self.observer {
            observer.on_event(event);
        }
    }
}
