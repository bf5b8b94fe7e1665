//! Streaming extraction of one archive into a destination root.
//!
//! # Platform Behavior
//!
//! **Unix**: archive mode bits are applied according to the selected
//! `PermissionStrategy`.
//!
//! **Windows (non-Unix)**: permission handling is a no-op.

use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Read};
use std::path::Path;

use arcsort_fs::{ensure_dir, ensure_parent};

use crate::container::{Container, ContainerSource};
use crate::entry::{ContainerEntry, EntryKind, ExtractReport};
use crate::error::{Error, Result};
use crate::options::{ExtractOptions, ExtractProgress};
use crate::sanitize::sanitize_entry_name;

/// Lifecycle of one extraction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtractState {
    Opened,
    Sizing,
    Iterating,
    Done,
    Failed,
}

impl fmt::Display for ExtractState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Opened => "opened",
            Self::Sizing => "sizing",
            Self::Iterating => "iterating",
            Self::Done => "done",
            Self::Failed => "failed",
        })
    }
}

fn enter(archive: &Path, state: ExtractState) {
    tracing::debug!(archive = %archive.display(), %state, "extractor state");
}

/// Extract every retained entry of `archive` under `dest`.
///
/// Sizing runs on a second handle when the format has no index, so the
/// progress callback always has a denominator before the first byte is
/// written. Any failure aborts this archive only, with the entry attached.
pub fn extract_archive(
    archive: impl AsRef<Path>,
    dest: impl AsRef<Path>,
    options: &ExtractOptions,
) -> Result<ExtractReport> {
    let archive = archive.as_ref();
    let dest = dest.as_ref();

    let result = (|| {
        let source = ContainerSource::new(archive)?;
        let mut container = source.open()?;
        enter(archive, ExtractState::Opened);

        enter(archive, ExtractState::Sizing);
        let total = match container.declared_size() {
            Some(total) => total,
            None => source.total_size()?,
        };

        enter(archive, ExtractState::Iterating);
        extract_container(container.as_mut(), total, dest, options)
    })();

    match &result {
        Ok(report) => {
            enter(archive, ExtractState::Done);
            tracing::debug!(
                archive = %archive.display(),
                files = report.files_written,
                bytes = report.bytes_extracted,
                "extraction finished"
            );
        }
        Err(e) => {
            enter(archive, ExtractState::Failed);
            tracing::debug!(archive = %archive.display(), error = %e, "extraction failed");
        }
    }
    result
}

/// Run the iterating phase over an already opened container.
pub fn extract_container(
    container: &mut dyn Container,
    total_bytes: u64,
    dest: &Path,
    options: &ExtractOptions,
) -> Result<ExtractReport> {
    ensure_dir(dest)?;

    let mut report = ExtractReport::new(container.format(), total_bytes);
    let mut tally = Tally {
        bytes: 0,
        total: total_bytes,
        options,
    };

    container.for_each_entry(&mut |entry: ContainerEntry<'_>| {
        report.entries_seen += 1;
        write_entry(entry, dest, options, &mut report, &mut tally)
    })?;

    report.total_bytes = tally.total;
    report.bytes_extracted = tally.bytes;
    tally.emit();
    Ok(report)
}

fn write_entry(
    entry: ContainerEntry<'_>,
    dest: &Path,
    options: &ExtractOptions,
    report: &mut ExtractReport,
    tally: &mut Tally<'_>,
) -> Result<()> {
    let ContainerEntry { header, reader } = entry;

    match header.kind {
        EntryKind::Link | EntryKind::Special => {
            tracing::debug!(entry = %header.name, kind = ?header.kind, "skipping non-regular entry");
            report.entries_skipped += 1;
            return Ok(());
        }
        EntryKind::Directory if options.flatten || is_root_marker(&header.name) => {
            report.entries_skipped += 1;
            return Ok(());
        }
        _ => {}
    }

    // Sanitize before any filesystem call for this entry.
    let target = sanitize_entry_name(&header.name, dest, options)?;

    if header.kind == EntryKind::Directory {
        ensure_dir(&target.resolved)?;
        options
            .perm_strategy
            .apply_to_path(&target.resolved, header.kind, header.mode)?;
        report.dirs_created += 1;
        return Ok(());
    }

    let reader = reader.ok_or_else(|| Error::corrupted(&header.name, "file entry has no data"))?;
    ensure_parent(&target.resolved)?;
    let mut out = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&target.resolved)
        .map_err(|e| Error::entry(&header.name, e))?;

    let mut counting = CountingReader {
        inner: reader,
        tally,
    };
    io::copy(&mut counting, &mut out).map_err(|e| Error::entry(&header.name, e))?;
    drop(out);

    options
        .perm_strategy
        .apply_to_path(&target.resolved, header.kind, header.mode)?;
    report.files_written += 1;
    Ok(())
}

/// Directory entries that name the archive root itself (`""`, `/`, `./`).
fn is_root_marker(name: &str) -> bool {
    name.split(['/', '\\'])
        .all(|segment| matches!(segment.trim(), "" | "."))
}

/// Running byte total for one archive.
struct Tally<'o> {
    bytes: u64,
    total: u64,
    options: &'o ExtractOptions,
}

impl Tally<'_> {
    fn advance(&mut self, n: u64) {
        self.bytes = self.bytes.saturating_add(n);
        // Under-declared sizes grow the denominator instead of overshooting it.
        self.total = self.total.max(self.bytes);
        self.emit();
    }

    fn emit(&self) {
        self.options.report(ExtractProgress {
            bytes_extracted: self.bytes,
            total_bytes: self.total,
        });
    }
}

/// Reader proxy that reports every chunk it hands out.
struct CountingReader<'r, 't, 'o> {
    inner: &'r mut dyn Read,
    tally: &'t mut Tally<'o>,
}

impl Read for CountingReader<'_, '_, '_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            self.tally.advance(n as u64);
        }
        Ok(n)
    }
}
