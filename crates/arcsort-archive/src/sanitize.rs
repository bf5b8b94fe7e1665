use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};
use crate::options::ExtractOptions;

const REPLACED: [char; 8] = ['<', '>', ':', '"', '|', '?', '*', '\0'];

/// A relative path that is safe to join under any extraction root.
///
/// Non-empty, not absolute, made only of normal components. Checked when
/// the value is built and never again.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SanitizedRelativePath(PathBuf);

impl SanitizedRelativePath {
    /// Returns `None` if `path` breaks any of the invariants.
    pub fn new(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let mut components = path.components().peekable();
        components.peek()?;
        if components.all(|c| matches!(c, Component::Normal(_))) {
            Some(Self(path))
        } else {
            None
        }
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl AsRef<Path> for SanitizedRelativePath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

/// Result of sanitizing an archive entry name.
#[derive(Clone, Debug)]
pub struct SanitizedPath {
    pub original: String,
    pub relative: SanitizedRelativePath,
    pub resolved: PathBuf,
}

/// Turn an untrusted entry name into a path under `root`.
///
/// Both `/` and `\` separate segments. Each segment is trimmed and has
/// `< > : " | ? *` replaced with `_`; empty and `.` segments are dropped and
/// `..` pops the previous segment. A `..` that would climb out of `root`
/// fails with [`Error::PathTraversal`]. With [`ExtractOptions::flatten`]
/// only the text after the last `/` is kept, as a single segment with `\`
/// replaced too. An empty result becomes `_`.
pub fn sanitize_entry_name(
    name: &str,
    root: impl AsRef<Path>,
    options: &ExtractOptions,
) -> Result<SanitizedPath> {
    let root = root.as_ref();
    let trimmed = name.trim();
    let traversal = || Error::PathTraversal {
        entry: name.to_string(),
        resolved: normalize_path(&root.join(trimmed.replace('\\', "/"))),
    };

    let mut segments: Vec<String> = Vec::new();
    if options.flatten {
        let base = trimmed.rsplit('/').next().unwrap_or(trimmed).trim();
        match base {
            "" | "." => {}
            ".." => return Err(traversal()),
            _ => segments.push(base.replace(REPLACED, "_").replace('\\', "_")),
        }
    } else {
        for raw in trimmed.split(['/', '\\']) {
            match raw.trim() {
                "" | "." => {}
                ".." => {
                    if segments.pop().is_none() {
                        return Err(traversal());
                    }
                }
                segment => segments.push(segment.replace(REPLACED, "_")),
            }
        }
    }
    if segments.is_empty() {
        segments.push("_".to_string());
    }

    let relative: PathBuf = segments.iter().collect();
    let resolved = normalize_path(&root.join(&relative));
    let root = normalize_path(root);
    if !resolved.starts_with(&root) || resolved == root {
        return Err(Error::PathTraversal {
            entry: name.to_string(),
            resolved,
        });
    }

    let relative = SanitizedRelativePath::new(relative).ok_or_else(|| Error::PathTraversal {
        entry: name.to_string(),
        resolved: resolved.clone(),
    })?;

    Ok(SanitizedPath {
        original: name.to_string(),
        relative,
        resolved,
    })
}

/// Lexically resolve `.` and `..` without touching the filesystem.
fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                result.pop();
            }
            Component::CurDir => {}
            other => result.push(other.as_os_str()),
        }
    }
    result
}
