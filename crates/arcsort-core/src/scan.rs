use std::path::{Path, PathBuf};

use arcsort_archive::is_supported_archive;
use arcsort_fs::WORKSPACE_PREFIX;
use walkdir::{DirEntry, WalkDir};

use crate::error::ScanError;

/// Find every supported archive under `root`, in file-name order.
///
/// Returned paths are absolute. Leftover extraction workspaces from an
/// interrupted run are not descended into. Any walk error aborts the scan.
pub fn scan_archives(root: impl AsRef<Path>) -> Result<Vec<PathBuf>, ScanError> {
    let root = root.as_ref();
    let root = root.canonicalize().map_err(|e| ScanError::Root {
        root: root.to_path_buf(),
        source: e,
    })?;
    if !root.is_dir() {
        return Err(ScanError::NotADirectory { root });
    }

    let mut archives = Vec::new();
    let walker = WalkDir::new(&root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_workspace(entry));
    for entry in walker {
        let entry = entry.map_err(|e| ScanError::Walk {
            root: root.clone(),
            source: e,
        })?;
        if entry.file_type().is_file() && is_supported_archive(entry.path()) {
            tracing::debug!(archive = %entry.path().display(), "found archive");
            archives.push(entry.into_path());
        }
    }

    tracing::info!(root = %root.display(), count = archives.len(), "scan complete");
    Ok(archives)
}

fn is_workspace(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with(WORKSPACE_PREFIX))
}
