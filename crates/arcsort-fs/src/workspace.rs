use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::{Error, Result};

/// Name prefix of every workspace directory.
pub const WORKSPACE_PREFIX: &str = ".arcsort-";

/// A private temporary directory owned by exactly one job.
///
/// The directory and everything in it is removed when the workspace is
/// dropped, whatever the job outcome. Use [`Workspace::close`] to observe
/// removal errors instead of only logging them.
#[derive(Debug)]
pub struct Workspace {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl Workspace {
    /// Create the workspace in the directory that holds `archive`, so the
    /// extracted files land on the same volume as the archive.
    pub fn beside(archive: impl AsRef<Path>) -> Result<Self> {
        let archive = archive.as_ref();
        let parent = match archive.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        Self::create_in(parent)
    }

    /// Create the workspace under the platform temp directory.
    pub fn in_system_temp() -> Result<Self> {
        Self::create_in(&std::env::temp_dir())
    }

    fn create_in(parent: &Path) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(parent)
            .map_err(|e| Error::CreateDir {
                path: parent.to_path_buf(),
                source: e,
            })?;
        let path = dir.path().to_path_buf();
        tracing::trace!(workspace = %path.display(), "workspace created");
        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the workspace now and report whether that worked.
    pub fn close(mut self) -> Result<()> {
        match self.dir.take() {
            Some(dir) => dir.close().map_err(|e| Error::Remove {
                path: self.path.clone(),
                source: e,
            }),
            None => Ok(()),
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            if let Err(e) = dir.close() {
                tracing::warn!(
                    workspace = %self.path.display(),
                    error = %e,
                    "failed to remove workspace"
                );
            }
        }
    }
}
