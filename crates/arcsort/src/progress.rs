use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use arcsort_core::{JobId, ProgressEvent, ProgressObserver};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use once_cell::sync::Lazy;

const OVERALL_STYLE: &str = "{spinner:.blue} {msg:.cyan} [{elapsed_precise}] {wide_bar:.cyan/blue} {pos}/{len} archives";

const BYTES_STYLE: &str = "  {spinner:.blue} {wide_msg} [{bar:30.white/dim}] {bytes}/{total_bytes} ({bytes_per_sec})";

const FILES_STYLE: &str = "  {spinner:.blue} {wide_msg} [{bar:30.white/dim}] {pos}/{len} files";

const TICK: &str = "⠁⠂⠄⡀⢀⠠⠐⠈ ";

const PB_CHARS: &str = "█▓▒░  ";

fn style(template: &str) -> Option<ProgressStyle> {
    ProgressStyle::with_template(template)
        .ok()
        .map(|s| s.tick_chars(TICK).progress_chars(PB_CHARS))
}

static OVERALL_TEMPLATE: Lazy<Option<ProgressStyle>> = Lazy::new(|| style(OVERALL_STYLE));
static BYTES_TEMPLATE: Lazy<Option<ProgressStyle>> = Lazy::new(|| style(BYTES_STYLE));
static FILES_TEMPLATE: Lazy<Option<ProgressStyle>> = Lazy::new(|| style(FILES_STYLE));

fn styled(pb: ProgressBar, template: &Lazy<Option<ProgressStyle>>) -> ProgressBar {
    match template.as_ref() {
        Some(style) => pb.with_style(style.clone()),
        None => pb,
    }
}

struct JobBar {
    pb: ProgressBar,
    name: String,
    routing: bool,
}

/// Terminal bars: one for the run, one per in-flight archive.
pub struct TerminalProgress {
    multi: MultiProgress,
    overall: ProgressBar,
    jobs: Mutex<HashMap<JobId, JobBar>>,
}

impl TerminalProgress {
    pub fn new() -> Self {
        let multi = MultiProgress::new();
        let overall = multi.add(styled(ProgressBar::new(0), &OVERALL_TEMPLATE));
        overall.set_message("Overall");
        overall.enable_steady_tick(Duration::from_millis(100));
        Self {
            multi,
            overall,
            jobs: Mutex::default(),
        }
    }

    fn with_job(&self, job: JobId, f: impl FnOnce(&mut JobBar)) {
        let mut jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(bar) = jobs.get_mut(&job) {
            f(bar);
        }
    }
}

impl Default for TerminalProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressObserver for TerminalProgress {
    fn on_event(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::RunStarted { jobs } => {
                self.overall.set_length(*jobs);
                self.overall.set_position(0);
            }
            ProgressEvent::JobStarted { job, archive } => {
                let name = archive
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| archive.display().to_string());
                let pb = self.multi.insert_before(
                    &self.overall,
                    styled(ProgressBar::new(0), &BYTES_TEMPLATE),
                );
                pb.set_message(format!("Extracting {name}"));
                pb.enable_steady_tick(Duration::from_millis(100));
                let bar = JobBar {
                    pb,
                    name,
                    routing: false,
                };
                self.jobs
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .insert(*job, bar);
            }
            ProgressEvent::Extracted { job, bytes, total } => self.with_job(*job, |bar| {
                bar.pb.set_length(*total);
                bar.pb.set_position(*bytes);
            }),
            ProgressEvent::Copied { job, files, total } => self.with_job(*job, |bar| {
                if !bar.routing {
                    bar.routing = true;
                    if let Some(style) = FILES_TEMPLATE.as_ref() {
                        bar.pb.set_style(style.clone());
                    }
                    bar.pb.set_message(format!("Routing {}", bar.name));
                }
                bar.pb.set_length(*total);
                bar.pb.set_position(*files);
            }),
            ProgressEvent::JobFinished { job, done, .. } => {
                let bar = self
                    .jobs
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .remove(job);
                if let Some(bar) = bar {
                    bar.pb.finish_and_clear();
                    self.multi.remove(&bar.pb);
                }
                self.overall.set_position(*done);
            }
            ProgressEvent::RunFinished { done, total } => {
                self.overall
                    .finish_with_message(format!("Processed {done}/{total}"));
            }
        }
    }
}
