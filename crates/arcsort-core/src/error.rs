use std::io;
use std::path::PathBuf;

/// The directory walk that discovers archives failed. Ends the run.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("cannot access scan root '{}': {source}", root.display())]
    Root { root: PathBuf, source: io::Error },

    #[error("scan root '{}' is not a directory", root.display())]
    NotADirectory { root: PathBuf },

    #[error("failed to scan '{}': {source}", root.display())]
    Walk {
        root: PathBuf,
        source: walkdir::Error,
    },
}

/// Why one archive job failed. Never ends the run.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("cannot create extraction workspace: {0}")]
    Workspace(#[source] arcsort_fs::Error),

    #[error("cannot open container: {0}")]
    ContainerOpen(#[source] arcsort_archive::Error),

    #[error("unsafe entry rejected: {0}")]
    PathTraversal(#[source] arcsort_archive::Error),

    #[error("extraction failed: {0}")]
    EntryIo(#[source] arcsort_archive::Error),

    #[error("routing failed: {0}")]
    Routing(#[source] arcsort_fs::Error),

    #[error("worker panicked: {0}")]
    Panicked(String),
}

impl JobError {
    /// Stable identifier used in machine-readable summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Workspace(_) => "workspace",
            Self::ContainerOpen(_) => "container_open",
            Self::PathTraversal(_) => "path_traversal",
            Self::EntryIo(_) => "entry_io",
            Self::Routing(_) => "routing",
            Self::Panicked(_) => "panicked",
        }
    }
}

impl From<arcsort_archive::Error> for JobError {
    fn from(err: arcsort_archive::Error) -> Self {
        use arcsort_archive::Error as E;
        match err {
            E::UnsupportedFormat { .. } | E::Open { .. } => Self::ContainerOpen(err),
            E::PathTraversal { .. } => Self::PathTraversal(err),
            E::Entry { .. } | E::Corrupted { .. } | E::Fs(_) => Self::EntryIo(err),
        }
    }
}
