use std::path::Path;

use crate::Result;

/// Permission bits to apply to an extracted file or directory.
///
/// On non-Unix platforms every mode is a no-op; the platform default applies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PermissionMode {
    /// Leave whatever the process umask produced.
    #[default]
    Inherit,

    /// `0o644` (rw-r--r--), the default for files.
    File,

    /// `0o755` (rwxr-xr-x), the default for directories.
    Directory,

    /// Explicit Unix mode bits, e.g. taken from a zip entry.
    Custom(u32),
}

impl PermissionMode {
    /// Unix mode bits, or `None` for [`PermissionMode::Inherit`].
    pub fn to_unix_mode(self) -> Option<u32> {
        match self {
            Self::Inherit => None,
            Self::File => Some(0o644),
            Self::Directory => Some(0o755),
            Self::Custom(mode) => Some(mode & 0o7777),
        }
    }

    /// Apply the mode to an existing path.
    pub fn apply_to_path(self, path: &Path) -> Result<()> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = self.to_unix_mode() {
                std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).map_err(
                    |e| crate::Error::Write {
                        path: path.to_path_buf(),
                        source: e,
                    },
                )?;
            }
        }

        #[cfg(not(unix))]
        let _ = path;

        Ok(())
    }
}

impl From<u32> for PermissionMode {
    fn from(mode: u32) -> Self {
        Self::Custom(mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_inherit() {
        assert_eq!(PermissionMode::default(), PermissionMode::Inherit);
        assert_eq!(PermissionMode::Inherit.to_unix_mode(), None);
    }

    #[test]
    fn unix_modes() {
        assert_eq!(PermissionMode::File.to_unix_mode(), Some(0o644));
        assert_eq!(PermissionMode::Directory.to_unix_mode(), Some(0o755));
        assert_eq!(PermissionMode::from(0o100_755).to_unix_mode(), Some(0o755));
    }

    #[cfg(unix)]
    #[test]
    fn apply_sets_bits() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        std::fs::write(&path, "x").unwrap();

        PermissionMode::Custom(0o600).apply_to_path(&path).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
