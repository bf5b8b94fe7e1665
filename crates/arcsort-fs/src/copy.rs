use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use crate::dir::ensure_parent;
use crate::{Error, Result};

const COPY_BUFFER: usize = 64 * 1024;
const MAX_SUFFIX: u32 = 9999;

/// What to do when a copy destination already exists.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// Claim `name (1).ext`, `name (2).ext`, ... instead.
    #[default]
    Rename,
    /// Truncate and replace the existing file.
    Overwrite,
}

/// Copy `src` to `dst` by streaming its bytes, then flush the result to disk.
///
/// Never a rename: source and destination may live on different volumes.
/// Missing parents of `dst` are created. Returns the path actually written,
/// which differs from `dst` only when [`ConflictPolicy::Rename`] had to pick
/// another name.
pub fn copy_durable(
    src: impl AsRef<Path>,
    dst: impl AsRef<Path>,
    policy: ConflictPolicy,
) -> Result<PathBuf> {
    let src = src.as_ref();
    let dst = dst.as_ref();

    let mut source = File::open(src).map_err(|e| Error::Read {
        path: src.to_path_buf(),
        source: e,
    })?;
    let permissions = source
        .metadata()
        .map_err(|e| Error::Read {
            path: src.to_path_buf(),
            source: e,
        })?
        .permissions();

    ensure_parent(dst)?;
    let (mut target, written) = claim(dst, policy)?;

    if let Err(e) = stream(&mut source, src, &mut target, &written) {
        drop(target);
        let _ = fs::remove_file(&written);
        return Err(e);
    }

    fs::set_permissions(&written, permissions).map_err(|e| Error::Write {
        path: written.clone(),
        source: e,
    })?;
    target.sync_all().map_err(|e| Error::Write {
        path: written.clone(),
        source: e,
    })?;

    Ok(written)
}

fn stream(source: &mut File, src: &Path, target: &mut File, dst: &Path) -> Result<()> {
    let mut buffer = vec![0u8; COPY_BUFFER];
    loop {
        let n = match source.read(&mut buffer) {
            Ok(0) => return Ok(()),
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(Error::Read {
                    path: src.to_path_buf(),
                    source: e,
                });
            }
        };
        target.write_all(&buffer[..n]).map_err(|e| Error::Write {
            path: dst.to_path_buf(),
            source: e,
        })?;
    }
}

/// Open the destination file according to `policy`.
///
/// `create_new` makes the claim atomic, so two workers racing for the same
/// name always end up with distinct files.
fn claim(dst: &Path, policy: ConflictPolicy) -> Result<(File, PathBuf)> {
    match policy {
        ConflictPolicy::Overwrite => {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(dst)
                .map_err(|e| Error::Write {
                    path: dst.to_path_buf(),
                    source: e,
                })?;
            Ok((file, dst.to_path_buf()))
        }
        ConflictPolicy::Rename => {
            for attempt in 0..=MAX_SUFFIX {
                let candidate = if attempt == 0 {
                    dst.to_path_buf()
                } else {
                    numbered(dst, attempt)
                };
                match OpenOptions::new().write(true).create_new(true).open(&candidate) {
                    Ok(file) => return Ok((file, candidate)),
                    Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                    Err(e) => {
                        return Err(Error::Write {
                            path: candidate,
                            source: e,
                        });
                    }
                }
            }
            Err(Error::NameExhausted {
                path: dst.to_path_buf(),
            })
        }
    }
}

/// `dir/name.ext` -> `dir/name (n).ext`
fn numbered(path: &Path, n: u32) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem} ({n}).{}", ext.to_string_lossy()),
        None => format!("{stem} ({n})"),
    };
    path.with_file_name(name)
}
