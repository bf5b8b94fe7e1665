use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use super::{Container, Visit};
use crate::entry::{ContainerEntry, EntryHeader, EntryKind};
use crate::error::{Error, Result};
use crate::format::{ArchiveFormat, Compression, Decoder};

/// Tarball, optionally compressed. Forward-only: sizing reopens the file.
pub(super) struct TarContainer {
    archive: tar::Archive<Decoder<BufReader<File>>>,
    codec: Compression,
    path: PathBuf,
}

impl TarContainer {
    pub(super) fn open(path: &Path, codec: Compression) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::open(path, e))?;
        let archive = tar::Archive::new(codec.decoder(BufReader::new(file)));
        Ok(Self {
            archive,
            codec,
            path: path.to_path_buf(),
        })
    }
}

impl Container for TarContainer {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::Tar(self.codec)
    }

    fn walk(&mut self, visit: &mut Visit<'_>) -> Result<()> {
        let entries = self
            .archive
            .entries()
            .map_err(|e| Error::open(&self.path, e))?;

        let mut first = true;
        for entry in entries {
            // A stream that is not a tarball at all fails on its first header.
            let mut entry = match entry {
                Ok(entry) => entry,
                Err(e) if first => return Err(Error::open(&self.path, e)),
                Err(e) => return Err(Error::corrupted(self.path.display().to_string(), e)),
            };
            first = false;

            let name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
            let entry_type = entry.header().entry_type();
            let kind = if entry_type.is_dir() {
                EntryKind::Directory
            } else if entry_type.is_symlink() || entry_type.is_hard_link() {
                EntryKind::Link
            } else if entry_type.is_file() || entry_type.is_contiguous() {
                EntryKind::File
            } else {
                EntryKind::Special
            };
            // Long names and local pax records are folded in by `tar`; global
            // pax records still come through as entries of their own.
            if entry_type.is_pax_global_extensions() {
                continue;
            }

            let header = EntryHeader {
                name,
                size: entry.size(),
                kind,
                // Only zip modes are honoured; tar entries take the defaults.
                mode: None,
            };
            let reader: Option<&mut dyn Read> = match kind {
                EntryKind::File => Some(&mut entry),
                _ => None,
            };
            visit(ContainerEntry::new(header, reader))?;
        }
        Ok(())
    }
}
