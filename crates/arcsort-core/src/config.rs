use std::path::PathBuf;

use arcsort_archive::ExtractOptions;
use arcsort_fs::ConflictPolicy;

/// Concurrency ceiling when none is configured.
pub const DEFAULT_JOBS: usize = 4;

/// The three optional destination trees.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Destinations {
    pub output: Option<PathBuf>,
    pub images: Option<PathBuf>,
    pub videos: Option<PathBuf>,
}

impl Destinations {
    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    pub fn images(mut self, path: impl Into<PathBuf>) -> Self {
        self.images = Some(path.into());
        self
    }

    pub fn videos(mut self, path: impl Into<PathBuf>) -> Self {
        self.videos = Some(path.into());
        self
    }

    /// `true` when no tree is configured and files go back beside their archive.
    pub fn is_empty(&self) -> bool {
        self.output.is_none() && self.images.is_none() && self.videos.is_none()
    }
}

/// Everything one run needs besides the list of archives.
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub jobs: usize,
    pub destinations: Destinations,
    pub on_conflict: ConflictPolicy,
    /// Create workspaces in the system temp directory instead of beside
    /// each archive.
    pub system_temp: bool,
    pub keep_archives: bool,
    pub extract: ExtractOptions,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            jobs: DEFAULT_JOBS,
            destinations: Destinations::default(),
            on_conflict: ConflictPolicy::default(),
            system_temp: false,
            keep_archives: false,
            extract: ExtractOptions::default(),
        }
    }
}

impl RunConfig {
    /// Set the concurrency ceiling. Zero is raised to one.
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn destinations(mut self, destinations: Destinations) -> Self {
        self.destinations = destinations;
        self
    }

    pub fn on_conflict(mut self, policy: ConflictPolicy) -> Self {
        self.on_conflict = policy;
        self
    }

    pub fn system_temp(mut self, system_temp: bool) -> Self {
        self.system_temp = system_temp;
        self
    }

    pub fn keep_archives(mut self, keep: bool) -> Self {
        self.keep_archives = keep;
        self
    }

    pub fn extract_options(mut self, options: ExtractOptions) -> Self {
        self.extract = options;
        self
    }

    pub fn flatten(mut self, flatten: bool) -> Self {
        self.extract = self.extract.flatten(flatten);
        self
    }
}
