use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use unrar::{Archive, FileHeader};

use super::{Container, Visit, sum_retained};
use crate::entry::{ContainerEntry, EntryHeader, EntryKind};
use crate::error::{Error, Result};
use crate::format::ArchiveFormat;

const S_IFMT: u32 = 0o170000;
const S_IFLNK: u32 = 0o120000;

/// RAR archive read through the unrar library.
///
/// Opening lists every header to find the declared size; a walk reopens the
/// archive in processing mode and decodes each file into memory before the
/// visitor sees it. Nothing is written to disk by the container itself.
pub(super) struct RarContainer {
    path: PathBuf,
    declared: u64,
}

impl RarContainer {
    pub(super) fn open(path: &Path) -> Result<Self> {
        let listing = Archive::new(path)
            .open_for_listing()
            .map_err(|e| Error::open(path, e))?;

        let mut headers = Vec::new();
        for header in listing {
            let header = header.map_err(|e| Error::open(path, e))?;
            headers.push((entry_name(&header), header.unpacked_size, header.is_file()));
        }
        let declared = sum_retained(
            headers
                .iter()
                .map(|(name, size, is_file)| (name.as_str(), *size, *is_file)),
        );

        Ok(Self {
            path: path.to_path_buf(),
            declared,
        })
    }
}

impl Container for RarContainer {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::Rar
    }

    fn declared_size(&self) -> Option<u64> {
        Some(self.declared)
    }

    fn walk(&mut self, visit: &mut Visit<'_>) -> Result<()> {
        let mut archive = Archive::new(&self.path)
            .open_for_processing()
            .map_err(|e| Error::open(&self.path, e))?;

        loop {
            let Some(current) = archive
                .read_header()
                .map_err(|e| Error::corrupted(self.path.display().to_string(), e))?
            else {
                return Ok(());
            };

            let name = entry_name(current.entry());
            let kind = entry_kind(current.entry());
            let header = EntryHeader {
                name: name.clone(),
                size: current.entry().unpacked_size,
                kind,
                mode: None,
            };

            archive = match kind {
                EntryKind::File => {
                    let (data, next) = current.read().map_err(|e| Error::corrupted(&name, e))?;
                    let mut cursor = Cursor::new(data);
                    visit(ContainerEntry::new(header, Some(&mut cursor as &mut dyn Read)))?;
                    next
                }
                _ => {
                    visit(ContainerEntry::new(header, None))?;
                    current.skip().map_err(|e| Error::corrupted(&name, e))?
                }
            };
        }
    }
}

/// Entry name with `/` separators, whatever the host that packed it.
fn entry_name(header: &FileHeader) -> String {
    header.filename.to_string_lossy().replace('\\', "/")
}

fn entry_kind(header: &FileHeader) -> EntryKind {
    if header.is_directory() {
        EntryKind::Directory
    } else if header.file_attr & S_IFMT == S_IFLNK {
        EntryKind::Link
    } else {
        EntryKind::File
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOST_UNIX: u8 = 3;
    const DOS_TIME: u32 = 0x4A21_0000;

    fn crc32(bytes: &[u8]) -> u32 {
        let mut crc = flate2::Crc::new();
        crc.update(bytes);
        crc.sum()
    }

    /// Prepend the 16-bit header CRC to a block body.
    fn block(body: Vec<u8>) -> Vec<u8> {
        let mut out = (crc32(&body) as u16).to_le_bytes().to_vec();
        out.extend(body);
        out
    }

    fn file_block(name: &str, data: &[u8], attr: u32, directory: bool) -> Vec<u8> {
        let flags: u16 = if directory { 0x8000 | 0x00E0 } else { 0x8000 };
        let mut body = vec![0x74];
        body.extend(flags.to_le_bytes());
        body.extend((32 + name.len() as u16).to_le_bytes());
        body.extend((data.len() as u32).to_le_bytes());
        body.extend((data.len() as u32).to_le_bytes());
        body.push(HOST_UNIX);
        body.extend(crc32(data).to_le_bytes());
        body.extend(DOS_TIME.to_le_bytes());
        body.push(29);
        body.push(0x30);
        body.extend((name.len() as u16).to_le_bytes());
        body.extend(attr.to_le_bytes());
        body.extend(name.as_bytes());
        let mut out = block(body);
        out.extend(data);
        out
    }

    /// RAR 4 archive with stored (uncompressed) members.
    fn stored_rar(files: &[(&str, &[u8])], dirs: &[&str]) -> Vec<u8> {
        let mut out = b"Rar!\x1a\x07\x00".to_vec();
        out.extend(block(vec![0x73, 0, 0, 13, 0, 0, 0, 0, 0, 0, 0]));
        for dir in dirs {
            out.extend(file_block(dir, b"", 0o40755, true));
        }
        for (name, data) in files {
            out.extend(file_block(name, data, 0o100644, false));
        }
        out.extend(block(vec![0x7B, 0x00, 0x40, 7, 0]));
        out
    }

    fn collect(container: &mut RarContainer) -> Vec<(String, EntryKind, String)> {
        let mut seen = Vec::new();
        container
            .for_each_entry(&mut |entry: ContainerEntry<'_>| {
                let mut body = String::new();
                if let Some(reader) = entry.reader {
                    reader.read_to_string(&mut body).unwrap();
                }
                seen.push((entry.header.name, entry.header.kind, body));
                Ok(())
            })
            .unwrap();
        seen
    }

    #[test]
    fn stored_members_walk_in_archive_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("b.rar");
        std::fs::write(
            &path,
            stored_rar(
                &[
                    ("album/a.mp4", b"aaaa"),
                    ("album/b.png", b"bb"),
                    ("album/OSX/junk", b"junk"),
                ],
                &["album"],
            ),
        )
        .unwrap();

        let mut container = RarContainer::open(&path).unwrap();
        assert_eq!(container.declared_size(), Some(6));
        assert_eq!(
            collect(&mut container),
            [
                ("album".to_string(), EntryKind::Directory, String::new()),
                ("album/a.mp4".to_string(), EntryKind::File, "aaaa".to_string()),
                ("album/b.png".to_string(), EntryKind::File, "bb".to_string()),
            ]
        );
    }

    #[test]
    fn opening_writes_nothing_beside_the_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("b.rar");
        std::fs::write(&path, stored_rar(&[("z.mp4", b"video")], &[])).unwrap();

        let mut container = RarContainer::open(&path).unwrap();
        collect(&mut container);

        let leftovers: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn garbage_is_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("b.rar");
        std::fs::write(&path, b"this is not a rar archive").unwrap();

        assert!(matches!(RarContainer::open(&path), Err(Error::Open { .. })));
    }
}
