use std::path::{Path, PathBuf};
use std::sync::Arc;

use arcsort_archive::{ExtractProgress, ExtractReport, extract_archive};
use arcsort_fs::Workspace;

use crate::config::RunConfig;
use crate::error::JobError;
use crate::progress::{JobId, ProgressHub};
use crate::route::{RouteReport, Router, extraction_root};

/// How one archive job ended.
#[derive(Debug)]
pub enum JobOutcome {
    Completed {
        extract: ExtractReport,
        routed: RouteReport,
        /// `false` when archives are kept or deletion failed.
        archive_removed: bool,
    },
    Failed(JobError),
}

impl JobOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// One archive, end to end: extract into a private workspace, route the
/// extracted files, then remove the source archive.
pub struct ArchiveJob {
    id: JobId,
    archive: PathBuf,
    config: Arc<RunConfig>,
    hub: Arc<ProgressHub>,
}

impl ArchiveJob {
    pub fn new(
        id: JobId,
        archive: impl Into<PathBuf>,
        config: Arc<RunConfig>,
        hub: Arc<ProgressHub>,
    ) -> Self {
        Self {
            id,
            archive: archive.into(),
            config,
            hub,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn archive(&self) -> &Path {
        &self.archive
    }

    /// Run the job to completion. Failures are returned, never propagated,
    /// and the workspace is gone by the time this returns.
    pub fn run(&self) -> JobOutcome {
        tracing::info!(job = %self.id, archive = %self.archive.display(), "job started");
        self.hub.register_job(self.id, &self.archive);

        let outcome = match self.execute() {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(
                    job = %self.id,
                    archive = %self.archive.display(),
                    error = %e,
                    "archive left in place"
                );
                JobOutcome::Failed(e)
            }
        };

        self.hub.finish_job(self.id, outcome.is_completed());
        outcome
    }

    fn execute(&self) -> Result<JobOutcome, JobError> {
        let workspace = if self.config.system_temp {
            Workspace::in_system_temp()
        } else {
            Workspace::beside(&self.archive)
        }
        .map_err(JobError::Workspace)?;

        let extract = extract_archive(&self.archive, workspace.path(), &self.extract_options())?;

        let root = extraction_root(workspace.path()).map_err(JobError::Routing)?;
        let router = Router::new(
            &self.config.destinations,
            &self.archive,
            self.config.on_conflict,
        );
        let routed = router
            .route_all(&root, |file| {
                self.hub.record_copied(self.id, file.copied, file.total);
            })
            .map_err(JobError::Routing)?;

        if let Err(e) = workspace.close() {
            tracing::warn!(job = %self.id, error = %e, "workspace cleanup failed");
        }

        let archive_removed = !self.config.keep_archives && self.remove_archive();
        tracing::info!(
            job = %self.id,
            archive = %self.archive.display(),
            bytes = extract.bytes_extracted,
            files = routed.files,
            archive_removed,
            "job completed"
        );

        Ok(JobOutcome::Completed {
            extract,
            routed,
            archive_removed,
        })
    }

    /// The configured options with this job's progress forwarding added.
    fn extract_options(&self) -> arcsort_archive::ExtractOptions {
        let hub = self.hub.clone();
        let id = self.id;
        let chained = self.config.extract.on_progress.clone();
        self.config
            .extract
            .clone()
            .on_progress(Arc::new(move |p: ExtractProgress| {
                hub.record_extracted(id, p.bytes_extracted, p.total_bytes);
                if let Some(callback) = &chained {
                    callback(p);
                }
            }))
    }

    fn remove_archive(&self) -> bool {
        match std::fs::remove_file(&self.archive) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    job = %self.id,
                    archive = %self.archive.display(),
                    error = %e,
                    "failed to delete archive"
                );
                false
            }
        }
    }
}
