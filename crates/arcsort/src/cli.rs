use std::path::PathBuf;

use arcsort_core::{ConflictPolicy, DEFAULT_JOBS, Destinations, RunConfig};
use clap::{Parser, ValueEnum};

#[derive(Clone, Debug, Parser)]
#[command(name = "arcsort", version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
pub struct App {
    /// Directory to scan for archives
    pub root: PathBuf,

    /// Destination for files that are neither images nor videos
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Destination for images
    #[arg(short = 'i', long)]
    pub image_output: Option<PathBuf>,

    /// Destination for videos
    #[arg(short = 'v', long)]
    pub video_output: Option<PathBuf>,

    /// Archives processed at the same time
    #[arg(short, long, default_value_t = DEFAULT_JOBS, env = "ARCSORT_JOBS")]
    pub jobs: usize,

    /// What to do when a destination file already exists
    #[arg(long, value_enum, default_value_t = OnConflict::Rename)]
    pub on_conflict: OnConflict,

    /// Extract into the system temp directory instead of beside each archive
    #[arg(long)]
    pub system_temp: bool,

    /// Drop directories from entry names and keep only the file name
    #[arg(long)]
    pub flatten: bool,

    /// Never delete source archives
    #[arg(long)]
    pub keep_archives: bool,

    #[arg(long, value_enum, default_value_t = SummaryFormat::Text)]
    pub summary: SummaryFormat,

    /// Disable progress bars
    #[arg(long)]
    pub no_progress: bool,

    /// Log job progress to stderr
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OnConflict {
    /// Keep both, as `name (1).ext`
    Rename,
    /// Replace the existing file
    Overwrite,
}

impl From<OnConflict> for ConflictPolicy {
    fn from(value: OnConflict) -> Self {
        match value {
            OnConflict::Rename => ConflictPolicy::Rename,
            OnConflict::Overwrite => ConflictPolicy::Overwrite,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SummaryFormat {
    Text,
    Json,
}

impl App {
    pub fn destinations(&self) -> Destinations {
        Destinations {
            output: self.output.clone(),
            images: self.image_output.clone(),
            videos: self.video_output.clone(),
        }
    }

    pub fn run_config(&self) -> RunConfig {
        RunConfig::default()
            .jobs(self.jobs)
            .destinations(self.destinations())
            .on_conflict(self.on_conflict.into())
            .system_temp(self.system_temp)
            .keep_archives(self.keep_archives)
            .flatten(self.flatten)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_is_well_formed() {
        App::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let app = App::try_parse_from(["arcsort", "/data"]).unwrap();
        let config = app.run_config();

        assert_eq!(app.root, PathBuf::from("/data"));
        assert!(config.destinations.is_empty());
        assert_eq!(config.on_conflict, ConflictPolicy::Rename);
        assert!(!config.keep_archives);
        assert!(!config.extract.flatten);
        assert_eq!(app.summary, SummaryFormat::Text);
    }

    #[test]
    fn all_flags() {
        let app = App::try_parse_from([
            "arcsort",
            "/data",
            "-o",
            "/out",
            "-i",
            "/img",
            "-v",
            "/vid",
            "-j",
            "8",
            "--on-conflict",
            "overwrite",
            "--system-temp",
            "--flatten",
            "--keep-archives",
            "--summary",
            "json",
            "--no-progress",
            "--verbose",
        ])
        .unwrap();
        let config = app.run_config();

        assert_eq!(config.jobs, 8);
        assert_eq!(config.destinations.output, Some(PathBuf::from("/out")));
        assert_eq!(config.destinations.images, Some(PathBuf::from("/img")));
        assert_eq!(config.destinations.videos, Some(PathBuf::from("/vid")));
        assert_eq!(config.on_conflict, ConflictPolicy::Overwrite);
        assert!(config.system_temp);
        assert!(config.extract.flatten);
        assert!(config.keep_archives);
        assert_eq!(app.summary, SummaryFormat::Json);
        assert!(app.no_progress && app.verbose);
    }

    #[test]
    fn root_is_required() {
        assert!(App::try_parse_from(["arcsort"]).is_err());
    }
}
