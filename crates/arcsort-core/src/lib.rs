//! The arcsort pipeline: discover archives, extract each one into a private
//! workspace, route the files by media kind, then remove the archive.
//!
//! - `scan.rs` - archive discovery
//! - `media.rs` - extension-based classification
//! - `route.rs` - destination resolution and the copy pass
//! - `job.rs` - one archive end to end
//! - `orchestrator.rs` - bounded job pool and run summary
//! - `progress.rs` - shared progress state

pub mod config;
mod error;
pub mod job;
pub mod media;
mod orchestrator;
pub mod progress;
pub mod route;
pub mod scan;

pub use config::{DEFAULT_JOBS, Destinations, RunConfig};
pub use error::{JobError, ScanError};
pub use job::{ArchiveJob, JobOutcome};
pub use media::{MediaKind, classify};
pub use orchestrator::{JobReport, JobStatus, Orchestrator, RunSummary, process_archives};
pub use progress::{JobId, ProgressEvent, ProgressHub, ProgressObserver, ProgressSnapshot};
pub use scan::scan_archives;

pub use arcsort_archive::{ExtractOptions, PermissionStrategy};
pub use arcsort_fs::ConflictPolicy;
