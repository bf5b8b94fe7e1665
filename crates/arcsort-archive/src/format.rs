use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Extensions picked up at discovery time, lower-case, without the dot.
pub const SUPPORTED_EXTENSIONS: [&str; 7] = ["7z", "zip", "rar", "gz", "tar", "bz2", "xz"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    Tar(Compression),
    SevenZip,
    Rar,
    /// A single compressed file with no container around it.
    Stream(Compression),
}

/// Compression codec wrapped around a tarball or a bare stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Bzip2,
    Xz,
}

impl ArchiveFormat {
    /// Map a file name to a format by its extension, case-insensitively.
    ///
    /// `.gz`, `.bz2` and `.xz` files whose stem ends in `.tar` are tarballs;
    /// any other file with those extensions is a bare compressed stream.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        let compression = match ext.as_str() {
            "zip" => return Some(Self::Zip),
            "7z" => return Some(Self::SevenZip),
            "rar" => return Some(Self::Rar),
            "tar" => return Some(Self::Tar(Compression::None)),
            "gz" => Compression::Gzip,
            "bz2" => Compression::Bzip2,
            "xz" => Compression::Xz,
            _ => return None,
        };

        let stem_is_tar = Path::new(path.file_stem()?)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("tar"));
        if stem_is_tar {
            Some(Self::Tar(compression))
        } else {
            Some(Self::Stream(compression))
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zip => f.write_str("zip"),
            Self::SevenZip => f.write_str("7z"),
            Self::Rar => f.write_str("rar"),
            Self::Tar(Compression::None) => f.write_str("tar"),
            Self::Tar(c) => write!(f, "tar.{}", c.extension()),
            Self::Stream(c) => f.write_str(c.extension()),
        }
    }
}

/// `true` if the file would be accepted by [`crate::open_container`].
pub fn is_supported_archive(path: impl AsRef<Path>) -> bool {
    ArchiveFormat::from_path(path).is_some()
}

impl Compression {
    pub fn extension(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Gzip => "gz",
            Self::Bzip2 => "bz2",
            Self::Xz => "xz",
        }
    }

    /// Wrap `reader` in the matching decoder.
    pub fn decoder<R: Read>(self, reader: R) -> Decoder<R> {
        match self {
            Self::None => Decoder::Passthrough(reader),
            Self::Gzip => Decoder::Gzip(Box::new(flate2::read::GzDecoder::new(reader))),
            Self::Bzip2 => Decoder::Bzip2(Box::new(bzip2::read::BzDecoder::new(reader))),
            Self::Xz => Decoder::Xz(Box::new(xz2::read::XzDecoder::new(reader))),
        }
    }
}

/// Decoder wrapper for compressed tarballs and streams.
pub enum Decoder<R: Read> {
    Passthrough(R),
    Gzip(Box<flate2::read::GzDecoder<R>>),
    Bzip2(Box<bzip2::read::BzDecoder<R>>),
    Xz(Box<xz2::read::XzDecoder<R>>),
}

impl<R: Read> fmt::Debug for Decoder<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Passthrough(_) => "Passthrough",
            Self::Gzip(_) => "Gzip",
            Self::Bzip2(_) => "Bzip2",
            Self::Xz(_) => "Xz",
        })
    }
}

impl<R: Read> Read for Decoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Passthrough(r) => r.read(buf),
            Self::Gzip(d) => d.read(buf),
            Self::Bzip2(d) => d.read(buf),
            Self::Xz(d) => d.read(buf),
        }
    }
}

/// Guess the format from leading magic bytes.
///
/// Compressed data is reported as [`ArchiveFormat::Stream`] since the magic
/// alone cannot tell a tarball from any other payload.
pub fn detect_format(data: &[u8]) -> Option<ArchiveFormat> {
    match data {
        [0x50, 0x4B, 0x03, 0x04, ..] | [0x50, 0x4B, 0x05, 0x06, ..] => Some(ArchiveFormat::Zip),
        [0x37, 0x7A, 0xBC, 0xAF, 0x27, 0x1C, ..] => Some(ArchiveFormat::SevenZip),
        [0x52, 0x61, 0x72, 0x21, 0x1A, 0x07, ..] => Some(ArchiveFormat::Rar),
        [0x1F, 0x8B, ..] => Some(ArchiveFormat::Stream(Compression::Gzip)),
        [0x42, 0x5A, 0x68, ..] => Some(ArchiveFormat::Stream(Compression::Bzip2)),
        [0xFD, 0x37, 0x7A, 0x58, 0x5A, 0x00, ..] => Some(ArchiveFormat::Stream(Compression::Xz)),
        _ if is_tar_header(data) => Some(ArchiveFormat::Tar(Compression::None)),
        _ => None,
    }
}

fn is_tar_header(data: &[u8]) -> bool {
    data.len() >= 512 && data[257..262] == *b"ustar"
}

/// Read the head of a file and run [`detect_format`] on it.
pub fn sniff(path: impl AsRef<Path>) -> Option<ArchiveFormat> {
    let mut head = Vec::with_capacity(512);
    File::open(path)
        .ok()?
        .take(512)
        .read_to_end(&mut head)
        .ok()?;
    detect_format(&head)
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn extension_mapping_is_case_insensitive() {
        assert_eq!(ArchiveFormat::from_path("a.zip"), Some(ArchiveFormat::Zip));
        assert_eq!(ArchiveFormat::from_path("A.ZIP"), Some(ArchiveFormat::Zip));
        assert_eq!(ArchiveFormat::from_path("b.Rar"), Some(ArchiveFormat::Rar));
        assert_eq!(ArchiveFormat::from_path("c.7Z"), Some(ArchiveFormat::SevenZip));
        assert_eq!(
            ArchiveFormat::from_path("d.tar"),
            Some(ArchiveFormat::Tar(Compression::None))
        );
    }

    #[test]
    fn compressed_tarballs_and_streams() {
        assert_eq!(
            ArchiveFormat::from_path("x.tar.gz"),
            Some(ArchiveFormat::Tar(Compression::Gzip))
        );
        assert_eq!(
            ArchiveFormat::from_path("x.TAR.BZ2"),
            Some(ArchiveFormat::Tar(Compression::Bzip2))
        );
        assert_eq!(
            ArchiveFormat::from_path("x.tar.xz"),
            Some(ArchiveFormat::Tar(Compression::Xz))
        );
        assert_eq!(
            ArchiveFormat::from_path("notes.txt.gz"),
            Some(ArchiveFormat::Stream(Compression::Gzip))
        );
        assert_eq!(
            ArchiveFormat::from_path("dump.xz"),
            Some(ArchiveFormat::Stream(Compression::Xz))
        );
    }

    #[test]
    fn unsupported_extensions() {
        assert_eq!(ArchiveFormat::from_path("photo.jpg"), None);
        assert_eq!(ArchiveFormat::from_path("noext"), None);
        assert_eq!(ArchiveFormat::from_path("x.tgz"), None);
        assert!(!is_supported_archive("clip.mp4"));
        for ext in SUPPORTED_EXTENSIONS {
            assert!(is_supported_archive(format!("file.{ext}")), "{ext}");
        }
    }

    #[test]
    fn display_names() {
        assert_eq!(ArchiveFormat::Zip.to_string(), "zip");
        assert_eq!(ArchiveFormat::Tar(Compression::None).to_string(), "tar");
        assert_eq!(ArchiveFormat::Tar(Compression::Xz).to_string(), "tar.xz");
        assert_eq!(ArchiveFormat::Stream(Compression::Bzip2).to_string(), "bz2");
    }

    #[test]
    fn compression_none_decoder() {
        let decoder = Compression::None.decoder(Cursor::new(b"hello"));
        assert!(matches!(decoder, Decoder::Passthrough(_)));
    }

    #[test]
    fn compression_gzip_decoder_roundtrip() {
        use flate2::write::GzEncoder;
        use std::io::Write;

        let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(b"payload").unwrap();
        let compressed = encoder.finish().unwrap();

        let mut decoder = Compression::Gzip.decoder(Cursor::new(compressed));
        assert!(matches!(decoder, Decoder::Gzip(_)));
        let mut out = String::new();
        decoder.read_to_string(&mut out).unwrap();
        assert_eq!(out, "payload");
    }
}
