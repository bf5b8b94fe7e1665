use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use sevenz_rust::{Password, SevenZReader};

use super::{Container, Visit, sum_retained};
use crate::entry::{ContainerEntry, EntryHeader};
use crate::error::{Error, Result};
use crate::format::ArchiveFormat;

/// 7z archive opened with an empty password.
///
/// Solid blocks decode front to back, so every entry's stream is drained
/// after the visitor returns, whether it read the data or not.
pub(super) struct SevenZContainer {
    reader: SevenZReader<BufReader<File>>,
    path: PathBuf,
    declared: u64,
}

impl SevenZContainer {
    pub(super) fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::open(path, e))?;
        let len = file.metadata().map_err(|e| Error::open(path, e))?.len();
        let reader = SevenZReader::new(BufReader::new(file), len, Password::empty())
            .map_err(|e| Error::open(path, e))?;

        let declared = sum_retained(
            reader
                .archive()
                .files
                .iter()
                .map(|f| (f.name(), f.size(), !f.is_directory())),
        );

        Ok(Self {
            reader,
            path: path.to_path_buf(),
            declared,
        })
    }
}

impl Container for SevenZContainer {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::SevenZip
    }

    fn declared_size(&self) -> Option<u64> {
        Some(self.declared)
    }

    fn walk(&mut self, visit: &mut Visit<'_>) -> Result<()> {
        let mut failure: Option<Error> = None;

        let decoded = self.reader.for_each_entries(|entry, data| {
            // Later blocks still call back after a stop; keep refusing.
            if failure.is_some() {
                return Ok(false);
            }

            let name = entry.name().to_string();
            let outcome = if entry.is_directory() {
                visit(ContainerEntry::new(EntryHeader::directory(name.clone()), None))
            } else {
                let header = EntryHeader::file(name.clone(), entry.size());
                visit(ContainerEntry::new(header, Some(&mut *data)))
            }
            .and_then(|()| {
                io::copy(data, &mut io::sink())
                    .map(drop)
                    .map_err(|e| Error::corrupted(name, e))
            });

            match outcome {
                Ok(()) => Ok(true),
                Err(e) => {
                    failure = Some(e);
                    Ok(false)
                }
            }
        });

        if let Some(e) = failure {
            return Err(e);
        }
        decoded.map_err(|e| Error::corrupted(self.path.display().to_string(), e))
    }
}
