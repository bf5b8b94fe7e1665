use std::io::Read;

use crate::format::ArchiveFormat;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    /// Symbolic or hard link. Never materialised.
    Link,
    /// Device nodes, fifos and anything else a format can describe.
    Special,
}

/// Metadata of one entry as the container declares it.
///
/// `name` is untrusted: it may be absolute, contain `..`, use either
/// separator, or be empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryHeader {
    pub name: String,
    pub size: u64,
    pub kind: EntryKind,
    /// Unix mode bits, when the format records them.
    pub mode: Option<u32>,
}

impl EntryHeader {
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            kind: EntryKind::File,
            mode: None,
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: 0,
            kind: EntryKind::Directory,
            mode: None,
        }
    }

    pub fn with_mode(mut self, mode: Option<u32>) -> Self {
        self.mode = mode;
        self
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// One entry handed out during a container walk.
///
/// The reader borrows the container and is only valid inside the visit
/// callback. Directories and non-file kinds carry no reader.
pub struct ContainerEntry<'a> {
    pub header: EntryHeader,
    pub reader: Option<&'a mut dyn Read>,
}

impl<'a> ContainerEntry<'a> {
    pub fn new(header: EntryHeader, reader: Option<&'a mut dyn Read>) -> Self {
        Self { header, reader }
    }
}

/// What one extraction did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractReport {
    pub format: ArchiveFormat,
    /// Entries yielded by the container (platform junk excluded).
    pub entries_seen: u64,
    /// Links and special entries that were not written.
    pub entries_skipped: u64,
    pub files_written: u64,
    pub dirs_created: u64,
    /// Progress denominator, raised to `bytes_extracted` if the container
    /// under-declared its sizes.
    pub total_bytes: u64,
    pub bytes_extracted: u64,
}

impl ExtractReport {
    pub(crate) fn new(format: ArchiveFormat, total_bytes: u64) -> Self {
        Self {
            format,
            entries_seen: 0,
            entries_skipped: 0,
            files_written: 0,
            dirs_created: 0,
            total_bytes,
            bytes_extracted: 0,
        }
    }
}
