//! Destination resolution and the copy pass out of an extraction root.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use arcsort_fs::{ConflictPolicy, copy_durable};
use serde::Serialize;
use walkdir::WalkDir;

use crate::config::Destinations;
use crate::media::{MediaKind, classify};

type FsResult<T> = arcsort_fs::Result<T>;

/// The directory routing starts from: `temp` itself, or its only child when
/// the archive wrapped everything in one top-level directory.
pub fn extraction_root(temp: &Path) -> FsResult<PathBuf> {
    let read_err = |e: io::Error| arcsort_fs::Error::Read {
        path: temp.to_path_buf(),
        source: e,
    };

    let mut entries = fs::read_dir(temp).map_err(read_err)?;
    let Some(first) = entries.next().transpose().map_err(read_err)? else {
        return Ok(temp.to_path_buf());
    };
    if entries.next().is_some() {
        return Ok(temp.to_path_buf());
    }

    let is_dir = first.file_type().map_err(read_err)?.is_dir();
    Ok(if is_dir { first.path() } else { temp.to_path_buf() })
}

/// One file copied by [`Router::route_all`].
#[derive(Debug)]
pub struct RoutedFile<'a> {
    pub relative: &'a Path,
    pub kind: MediaKind,
    /// Where the bytes went. Differs from the resolved destination when the
    /// collision policy picked another name.
    pub written: &'a Path,
    /// Files copied so far, this one included.
    pub copied: u64,
    /// Files found by the pre-walk.
    pub total: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RouteReport {
    pub files: u64,
    pub images: u64,
    pub videos: u64,
}

/// Maps extracted files of one archive to their destination tree.
#[derive(Clone, Debug)]
pub struct Router {
    images: Option<PathBuf>,
    videos: Option<PathBuf>,
    output: Option<PathBuf>,
    beside: PathBuf,
    /// Source archive; never overwritten by a routed file.
    archive: PathBuf,
    policy: ConflictPolicy,
}

impl Router {
    /// With no destinations configured everything goes back beside
    /// `archive`, images and videos into `images/` and `videos/` there.
    pub fn new(destinations: &Destinations, archive: &Path, policy: ConflictPolicy) -> Self {
        let beside = match archive.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let archive = fs::canonicalize(archive).unwrap_or_else(|_| archive.to_path_buf());

        if destinations.is_empty() {
            return Self {
                images: Some(beside.join("images")),
                videos: Some(beside.join("videos")),
                output: Some(beside.clone()),
                beside,
                archive,
                policy,
            };
        }

        Self {
            images: destinations.images.clone(),
            videos: destinations.videos.clone(),
            output: destinations.output.clone(),
            beside,
            archive,
            policy,
        }
    }

    /// The collision policy for `destination`. A file landing on the source
    /// archive is always renamed, whatever the configured policy.
    fn policy_for(&self, destination: &Path) -> ConflictPolicy {
        let is_archive = destination == self.archive
            || fs::canonicalize(destination).is_ok_and(|d| d == self.archive);
        if is_archive {
            tracing::debug!(
                destination = %destination.display(),
                "destination is the source archive, renaming"
            );
            ConflictPolicy::Rename
        } else {
            self.policy
        }
    }

    /// Resolve where `relative` lands: image tree, video tree, output tree,
    /// then beside the archive, first configured match wins.
    pub fn destination_for(&self, relative: &Path, kind: MediaKind) -> PathBuf {
        let tree = match (kind, &self.images, &self.videos) {
            (MediaKind::Image, Some(images), _) => images,
            (MediaKind::Video, _, Some(videos)) => videos,
            _ => self.output.as_ref().unwrap_or(&self.beside),
        };
        tree.join(relative)
    }

    /// Copy every regular file under `root` to its destination, keeping its
    /// path relative to `root`.
    ///
    /// Files are counted by a pre-walk first so `on_file` always sees the
    /// final total. The first failed copy stops the pass; files already
    /// copied stay where they are.
    pub fn route_all(
        &self,
        root: &Path,
        mut on_file: impl FnMut(RoutedFile<'_>),
    ) -> FsResult<RouteReport> {
        let files = collect_files(root)?;
        let total = files.len() as u64;
        let mut report = RouteReport::default();

        for (index, source) in files.iter().enumerate() {
            let relative = source.strip_prefix(root).unwrap_or(source);
            let kind = classify(relative);
            let destination = self.destination_for(relative, kind);

            let written = copy_durable(source, &destination, self.policy_for(&destination))?;
            if written != destination {
                tracing::debug!(
                    file = %relative.display(),
                    written = %written.display(),
                    "destination taken, renamed"
                );
            }

            report.files += 1;
            match kind {
                MediaKind::Image => report.images += 1,
                MediaKind::Video => report.videos += 1,
                MediaKind::Other => {}
            }
            on_file(RoutedFile {
                relative,
                kind,
                written: &written,
                copied: index as u64 + 1,
                total,
            });
        }

        Ok(report)
    }
}

fn collect_files(root: &Path) -> FsResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| arcsort_fs::Error::Read {
            path: e.path().unwrap_or(root).to_path_buf(),
            source: e.into(),
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}
