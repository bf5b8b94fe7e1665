use std::io::{self, Write};

use arcsort_core::{JobStatus, RunSummary};
use console::style;
use indicatif::HumanBytes;

pub fn write_text(summary: &RunSummary, out: &mut impl Write) -> io::Result<()> {
    for job in &summary.jobs {
        let name = job.archive.display();
        match job.status {
            JobStatus::Completed => {
                let removed = if job.archive_removed { "removed" } else { "kept" };
                writeln!(
                    out,
                    "{} {name}: {} files, {} ({removed})",
                    style("ok").green(),
                    job.files_routed,
                    HumanBytes(job.bytes_extracted),
                )?;
            }
            JobStatus::Failed => {
                writeln!(
                    out,
                    "{} {name}: {}",
                    style("failed").red().bold(),
                    job.error.as_deref().unwrap_or("unknown error"),
                )?;
            }
        }
    }

    let failed = summary.failed().count();
    writeln!(
        out,
        "{} archives, {} completed, {} failed in {:.1}s",
        summary.jobs.len(),
        summary.completed(),
        failed,
        summary.elapsed_ms as f64 / 1000.0,
    )
}

pub fn write_json(summary: &RunSummary, out: &mut impl Write) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, summary)?;
    writeln!(out)
}
