use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unsupported archive format: '{}'", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("failed to open archive '{}': {reason}", path.display())]
    Open { path: PathBuf, reason: String },

    #[error("path traversal detected: entry '{entry}' resolves to '{}'", resolved.display())]
    PathTraversal { entry: String, resolved: PathBuf },

    #[error("failed to extract entry '{entry}': {source}")]
    Entry { entry: String, source: io::Error },

    #[error("archive is corrupted at entry '{entry}': {reason}")]
    Corrupted { entry: String, reason: String },

    #[error(transparent)]
    Fs(#[from] arcsort_fs::Error),
}

impl Error {
    pub(crate) fn open(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Open {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn entry(entry: impl Into<String>, source: io::Error) -> Self {
        Self::Entry {
            entry: entry.into(),
            source,
        }
    }

    pub(crate) fn corrupted(entry: impl Into<String>, reason: impl ToString) -> Self {
        Self::Corrupted {
            entry: entry.into(),
            reason: reason.to_string(),
        }
    }

    /// Name of the entry the failure is attached to, if any.
    pub fn entry_name(&self) -> Option<&str> {
        match self {
            Self::PathTraversal { entry, .. }
            | Self::Entry { entry, .. }
            | Self::Corrupted { entry, .. } => Some(entry),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
