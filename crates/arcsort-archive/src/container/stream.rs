use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use super::{Container, Visit};
use crate::entry::{ContainerEntry, EntryHeader};
use crate::error::{Error, Result};
use crate::format::{ArchiveFormat, Compression, Decoder};

/// A bare compressed file: one entry named after the file stem.
///
/// The uncompressed size is unknown until the stream has been decoded, so
/// the entry header reports 0 and sizing decodes a separate handle.
pub(super) struct StreamContainer {
    decoder: Option<Decoder<BufReader<File>>>,
    codec: Compression,
    name: String,
    path: PathBuf,
}

impl StreamContainer {
    pub(super) fn open(path: &Path, codec: Compression) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::open(path, e))?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            decoder: Some(codec.decoder(BufReader::new(file))),
            codec,
            name,
            path: path.to_path_buf(),
        })
    }
}

impl Container for StreamContainer {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::Stream(self.codec)
    }

    fn walk(&mut self, visit: &mut Visit<'_>) -> Result<()> {
        let Some(mut decoder) = self.decoder.take() else {
            return Ok(());
        };
        let header = EntryHeader::file(self.name.clone(), 0);
        visit(ContainerEntry::new(header, Some(&mut decoder as &mut dyn Read)))
    }

    /// Decode the whole stream and count the bytes. A payload that fails
    /// to decode is reported as unopenable.
    fn measure(&mut self) -> Result<u64> {
        let Some(mut decoder) = self.decoder.take() else {
            return Ok(0);
        };
        if crate::skip::should_skip(&self.name) {
            return Ok(0);
        }
        io::copy(&mut decoder, &mut io::sink()).map_err(|e| Error::open(&self.path, e))
    }
}
