//! Archive import for the CLI: progress bar, Ctrl+C, colored summary.

use anyhow::{Context, Result};
use log::info;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::BatchReport;
use crate::archive::open_source;
use crate::engine::Fb2Extractor;
use crate::engine::db_ops::RecordStore;
use crate::engine::progress::{finish_progress_bar, setup_progress, update_progress_bar};
use crate::pipeline::{Pipeline, log_summary};
use crate::utils::{Colors, Settings};

/// Import `archive` into `store` with the resolved CLI settings.
/// Fails if the archive cannot be opened, or if the user cancelled (after enqueued work drained).
pub fn import_archive(
    archive: &Path,
    store: &dyn RecordStore,
    settings: &Settings,
) -> Result<BatchReport> {
    let source = open_source(archive).context("open archive")?;

    let cancel_requested = Arc::new(AtomicBool::new(false));
    let cancel_requested_handler = Arc::clone(&cancel_requested);
    ctrlc::set_handler(move || {
        cancel_requested_handler.store(true, Ordering::Relaxed);
    })
    .context("set Ctrl+C handler")?;

    let bar = setup_progress(settings.verbose, source.list_entries().len());
    let extractor = Fb2Extractor;
    let report = Pipeline::new(settings.ingest.clone(), &extractor, store)
        .with_cancel_flag(Arc::clone(&cancel_requested))
        .run_with(&*source, |_| {
            if let Some(bar) = &bar {
                update_progress_bar(bar, 1);
            }
        })?;
    if let Some(bar) = &bar {
        finish_progress_bar(bar);
    }

    print_summary(&report);
    log_summary(archive, &report);
    if report.cancelled {
        return Err(anyhow::anyhow!(
            "Import cancelled by user; entries already stored were kept"
        ));
    }
    Ok(report)
}

/// Print summary counts, then each failure.
fn print_summary(report: &BatchReport) {
    info!(
        "{} | {} | {}",
        Colors::colorize(Colors::STORED, &format!("Stored: {}", report.stored())),
        Colors::colorize(Colors::SKIPPED, &format!("Skipped: {}", report.skipped())),
        Colors::colorize(Colors::FAILED, &format!("Failed: {}", report.failed()))
    );
    for (name, cause) in report.failures() {
        info!("  failed: {name}: {cause}");
    }
}
