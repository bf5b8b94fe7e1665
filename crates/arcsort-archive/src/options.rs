use std::fmt;
use std::path::Path;
use std::sync::Arc;

use arcsort_fs::PermissionMode;

use crate::Result;
use crate::entry::EntryKind;

/// Progress callback. Runs on the extraction hot path, so keep it cheap.
pub type ProgressFn = Arc<dyn Fn(ExtractProgress) + Send + Sync>;

#[derive(Clone, Default)]
pub struct ExtractOptions {
    pub perm_strategy: PermissionStrategy,
    /// Keep only the part of each entry name after its last separator.
    pub flatten: bool,
    pub on_progress: Option<ProgressFn>,
}

impl fmt::Debug for ExtractOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractOptions")
            .field("perm_strategy", &self.perm_strategy)
            .field("flatten", &self.flatten)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

/// Cumulative bytes written for one archive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExtractProgress {
    pub bytes_extracted: u64,
    pub total_bytes: u64,
}

impl ExtractOptions {
    pub fn permission_strategy(mut self, strategy: PermissionStrategy) -> Self {
        self.perm_strategy = strategy;
        self
    }

    pub fn flatten(mut self, flatten: bool) -> Self {
        self.flatten = flatten;
        self
    }

    pub fn on_progress(mut self, callback: ProgressFn) -> Self {
        self.on_progress = Some(callback);
        self
    }

    pub(crate) fn report(&self, progress: ExtractProgress) {
        if let Some(callback) = &self.on_progress {
            callback(progress);
        }
    }
}

/// How archive mode bits become on-disk permissions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PermissionStrategy {
    /// Archive bits with owner read/write (and search, for directories)
    /// forced on; 0644/0755 when absent.
    #[default]
    Standard,
    /// Archive bits verbatim; 0644/0755 when absent.
    Preserve,
    /// Ignore archive bits and leave the umask result.
    Inherit,
}

impl PermissionStrategy {
    pub fn resolve(self, kind: EntryKind, mode: Option<u32>) -> PermissionMode {
        let fallback = match kind {
            EntryKind::Directory => PermissionMode::Directory,
            _ => PermissionMode::File,
        };
        let owner = match kind {
            EntryKind::Directory => 0o700,
            _ => 0o600,
        };
        match (self, mode) {
            (Self::Inherit, _) => PermissionMode::Inherit,
            (Self::Standard, Some(m)) => PermissionMode::Custom(m | owner),
            (Self::Preserve, Some(m)) => PermissionMode::Custom(m),
            (_, None) => fallback,
        }
    }

    pub fn apply_to_path(self, path: &Path, kind: EntryKind, mode: Option<u32>) -> Result<()> {
        self.resolve(kind, mode).apply_to_path(path)?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[test]
    fn extraction_options_default() {
        let options = ExtractOptions::default();
        assert_eq!(options.perm_strategy, PermissionStrategy::Standard);
        assert!(!options.flatten);
        assert!(options.on_progress.is_none());
    }

    #[test]
    fn extraction_options_builder_pattern() {
        let options = ExtractOptions::default()
            .permission_strategy(PermissionStrategy::Preserve)
            .flatten(true);

        assert_eq!(options.perm_strategy, PermissionStrategy::Preserve);
        assert!(options.flatten);
    }

    #[test]
    fn extraction_options_on_progress_callback() {
        let seen = Arc::new(AtomicU64::new(0));
        let sink = seen.clone();
        let options = ExtractOptions::default().on_progress(Arc::new(move |p: ExtractProgress| {
            sink.store(p.bytes_extracted, Ordering::SeqCst);
        }));

        options.report(ExtractProgress {
            bytes_extracted: 50,
            total_bytes: 100,
        });
        assert_eq!(seen.load(Ordering::SeqCst), 50);
    }
}
