use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use arcsort_core::{ProgressObserver, process_archives};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{App, SummaryFormat};
use crate::progress::TerminalProgress;

mod cli;
mod progress;
mod summary;

fn main() -> Result<()> {
    let app = App::parse();
    init_tracing(app.verbose);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("arcsort-worker")
        .build()
        .context("failed to start the async runtime")?;

    let observer: Option<Arc<dyn ProgressObserver>> =
        if app.no_progress || !console::Term::stderr().is_term() {
            None
        } else {
            Some(Arc::new(TerminalProgress::new()))
        };

    let summary = runtime
        .block_on(process_archives(&app.root, app.run_config(), observer))
        .with_context(|| format!("failed to scan '{}'", app.root.display()))?;

    let mut stdout = io::stdout().lock();
    match app.summary {
        SummaryFormat::Text => summary::write_text(&summary, &mut stdout),
        SummaryFormat::Json => summary::write_json(&summary, &mut stdout),
    }
    .context("failed to write the run summary")?;

    Ok(())
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
