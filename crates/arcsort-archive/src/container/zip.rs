use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use zip::ZipArchive;

use super::{Container, Visit, sum_retained};
use crate::entry::{ContainerEntry, EntryHeader, EntryKind};
use crate::error::{Error, Result};
use crate::format::ArchiveFormat;

pub(super) struct ZipContainer {
    archive: ZipArchive<BufReader<File>>,
    declared: u64,
}

impl ZipContainer {
    pub(super) fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::open(path, e))?;
        let mut archive = ZipArchive::new(BufReader::new(file)).map_err(|e| Error::open(path, e))?;

        let mut headers = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let entry = archive.by_index_raw(i).map_err(|e| Error::open(path, e))?;
            headers.push((entry.name().to_string(), entry.size(), entry.is_file()));
        }
        let declared = sum_retained(
            headers
                .iter()
                .map(|(name, size, is_file)| (name.as_str(), *size, *is_file)),
        );

        Ok(Self { archive, declared })
    }
}

impl Container for ZipContainer {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::Zip
    }

    fn declared_size(&self) -> Option<u64> {
        Some(self.declared)
    }

    fn walk(&mut self, visit: &mut Visit<'_>) -> Result<()> {
        for i in 0..self.archive.len() {
            let label = self
                .archive
                .name_for_index(i)
                .map_or_else(|| format!("#{i}"), str::to_string);
            let mut file = self
                .archive
                .by_index(i)
                .map_err(|e| Error::corrupted(label, e))?;

            let kind = if file.is_dir() {
                EntryKind::Directory
            } else if file.is_symlink() {
                EntryKind::Link
            } else {
                EntryKind::File
            };
            let header = EntryHeader {
                name: file.name().to_string(),
                size: file.size(),
                kind,
                mode: file.unix_mode(),
            };

            let reader: Option<&mut dyn Read> = match kind {
                EntryKind::File => Some(&mut file),
                _ => None,
            };
            visit(ContainerEntry::new(header, reader))?;
        }
        Ok(())
    }
}
