//! One capability interface over every supported container format.
//!
//! A container is walked once, forward only. A second pass (sizing before
//! extracting) reopens the file through [`ContainerSource`] instead of
//! rewinding a handle, since tar streams and 7z solid blocks cannot rewind.

use std::path::{Path, PathBuf};

use crate::entry::{ContainerEntry, EntryKind};
use crate::error::{Error, Result};
use crate::format::{self, ArchiveFormat};
use crate::skip;

#[cfg(feature = "rar")]
mod rar;
#[cfg(feature = "sevenz")]
mod sevenz;
mod stream;
#[cfg(feature = "tar")]
mod tar;
#[cfg(feature = "zip")]
mod zip;

/// Callback receiving each entry of a walk.
pub type Visit<'v> = dyn FnMut(ContainerEntry<'_>) -> Result<()> + 'v;

pub trait Container {
    fn format(&self) -> ArchiveFormat;

    /// Walk every entry in container order, junk included.
    fn walk(&mut self, visit: &mut Visit<'_>) -> Result<()>;

    /// Total uncompressed size of the file entries, when the format records
    /// it up front. `None` means finding it takes a full pass.
    fn declared_size(&self) -> Option<u64> {
        None
    }

    /// Walk the entries, leaving out platform junk.
    fn for_each_entry(&mut self, visit: &mut Visit<'_>) -> Result<()> {
        self.walk(&mut |entry: ContainerEntry<'_>| {
            if skip::should_skip(&entry.header.name) {
                tracing::debug!(entry = %entry.header.name, "skipping platform junk");
                return Ok(());
            }
            visit(entry)
        })
    }

    /// Sum the sizes of the retained file entries by walking them.
    fn measure(&mut self) -> Result<u64> {
        let mut total = 0u64;
        self.for_each_entry(&mut |entry: ContainerEntry<'_>| {
            if entry.header.kind == EntryKind::File {
                total = total.saturating_add(entry.header.size);
            }
            Ok(())
        })?;
        Ok(total)
    }
}

/// Path plus format, able to hand out fresh handles on demand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContainerSource {
    path: PathBuf,
    format: ArchiveFormat,
}

impl ContainerSource {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let format =
            ArchiveFormat::from_path(&path).ok_or_else(|| Error::UnsupportedFormat {
                path: path.clone(),
            })?;
        Ok(Self { path, format })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> ArchiveFormat {
        self.format
    }

    /// Open a new handle positioned before the first entry.
    pub fn open(&self) -> Result<Box<dyn Container>> {
        self.open_inner().map_err(|e| self.with_hint(e))
    }

    fn open_inner(&self) -> Result<Box<dyn Container>> {
        let path = self.path.as_path();
        match self.format {
            #[cfg(feature = "zip")]
            ArchiveFormat::Zip => Ok(Box::new(zip::ZipContainer::open(path)?)),
            #[cfg(feature = "tar")]
            ArchiveFormat::Tar(codec) => Ok(Box::new(tar::TarContainer::open(path, codec)?)),
            #[cfg(feature = "sevenz")]
            ArchiveFormat::SevenZip => Ok(Box::new(sevenz::SevenZContainer::open(path)?)),
            #[cfg(feature = "rar")]
            ArchiveFormat::Rar => Ok(Box::new(rar::RarContainer::open(path)?)),
            ArchiveFormat::Stream(codec) => Ok(Box::new(stream::StreamContainer::open(path, codec)?)),
            #[allow(unreachable_patterns)]
            _ => Err(Error::UnsupportedFormat {
                path: self.path.clone(),
            }),
        }
    }

    /// Total uncompressed size of the retained file entries, found on a
    /// fresh handle.
    pub fn total_size(&self) -> Result<u64> {
        self.open()?.measure()
    }

    /// Point out a misleading extension on open failures.
    fn with_hint(&self, err: Error) -> Error {
        match err {
            Error::Open { path, reason } => match format::sniff(&path) {
                Some(actual) if actual != self.format => Error::Open {
                    path,
                    reason: format!("{reason} (content looks like {actual})"),
                },
                _ => Error::Open { path, reason },
            },
            other => other,
        }
    }
}

/// Open the container at `path` and find its total uncompressed size.
///
/// The size comes from the format's own index when it has one, and from a
/// walk over a second, independent handle otherwise.
pub fn open_container(path: impl AsRef<Path>) -> Result<(Box<dyn Container>, u64)> {
    let source = ContainerSource::new(path.as_ref())?;
    let container = source.open()?;
    let total = match container.declared_size() {
        Some(total) => total,
        None => source.total_size()?,
    };
    Ok((container, total))
}

/// Sum of retained file sizes from an already-known header list.
pub(crate) fn sum_retained<'a>(entries: impl IntoIterator<Item = (&'a str, u64, bool)>) -> u64 {
    entries
        .into_iter()
        .filter(|(name, _, is_file)| *is_file && !skip::should_skip(name))
        .fold(0u64, |acc, (_, size, _)| acc.saturating_add(size))
}
