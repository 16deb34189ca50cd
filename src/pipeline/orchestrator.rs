//! Batch orchestration: one producer, N workers, one completion barrier.

use anyhow::{Context, Result};
use log::{debug, info};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::thread;

use crate::archive::{ArchiveSource, open_source};
use crate::engine::db_ops::RecordStore;
use crate::engine::{Fb2Extractor, MetadataExtractor};
use crate::{BatchReport, EntryOutcome, IngestConfig};

use super::context::{PipelineChannels, WorkerContext, create_pipeline_channels};
use super::producer::spawn_producer;
use super::worker::spawn_workers;

/// Ingestion pipeline over borrowed collaborators. Reusable across batches.
pub struct Pipeline<'a> {
    config: IngestConfig,
    extractor: &'a dyn MetadataExtractor,
    store: &'a dyn RecordStore,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: IngestConfig,
        extractor: &'a dyn MetadataExtractor,
        store: &'a dyn RecordStore,
    ) -> Self {
        Self {
            config,
            extractor,
            store,
            cancel: None,
        }
    }

    /// When `flag` becomes true the producer stops enqueuing; enqueued entries still finish.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Run one batch over an already opened source.
    pub fn run<A: ArchiveSource + ?Sized>(&self, source: &A) -> Result<BatchReport> {
        self.run_with(source, |_| {})
    }

    /// Like [`Self::run`], calling `on_outcome` on this thread for every outcome as it arrives
    /// (progress reporting, streaming results). Keep it fast: workers do not wait for it,
    /// but the report is not returned until it has seen every outcome.
    pub fn run_with<A, F>(&self, source: &A, mut on_outcome: F) -> Result<BatchReport>
    where
        A: ArchiveSource + ?Sized,
        F: FnMut(&EntryOutcome),
    {
        let num_workers = self.config.workers.max(1);
        let entries = source.list_entries();
        debug!(
            "batch {}: {} entries, {} workers, channel cap {}",
            source.location().display(),
            entries.len(),
            num_workers,
            self.config.channel_cap
        );

        let ctx = WorkerContext::new(source, self.extractor, self.store);
        let PipelineChannels {
            work_tx,
            work_rx,
            outcome_tx,
            outcome_rx,
        } = create_pipeline_channels(self.config.channel_cap);
        let suffix = self.config.suffix.as_str();
        let cancel = self.cancel.as_deref();

        thread::scope(|scope| -> Result<BatchReport> {
            let producer =
                spawn_producer(scope, entries, work_tx, outcome_tx.clone(), suffix, cancel);
            let workers = spawn_workers(scope, work_rx, &outcome_tx, &ctx, num_workers);
            // Dropping the last sender held here lets the loop below end once everyone is done.
            drop(outcome_tx);

            let mut report = BatchReport::default();
            while let Ok(outcome) = outcome_rx.recv() {
                on_outcome(&outcome);
                report.outcomes.push(outcome);
            }

            let summary = producer
                .join()
                .map_err(|_| anyhow::anyhow!("producer thread panicked"))?;
            for h in workers {
                h.join()
                    .map_err(|_| anyhow::anyhow!("worker thread panicked"))?;
            }
            debug!(
                "producer: {} enqueued, {} skipped",
                summary.enqueued, summary.skipped
            );
            report.cancelled = summary.cancelled;
            Ok(report)
        })
    }
}

/// Batch trigger: open the archive at `archive` (fatal on failure), extract FB2 metadata
/// from every recognized entry and upsert it into `store`. Per-entry failures are in the report.
pub fn ingest_archive(
    archive: &Path,
    store: &dyn RecordStore,
    config: &IngestConfig,
) -> Result<BatchReport> {
    let source = open_source(archive).context("open archive")?;
    let extractor = Fb2Extractor;
    let report = Pipeline::new(config.clone(), &extractor, store).run(&*source)?;
    log_summary(archive, &report);
    Ok(report)
}

/// One info line per batch.
pub fn log_summary(archive: &Path, report: &BatchReport) {
    info!(
        "{}: {} stored, {} skipped, {} failed{}",
        archive.display(),
        report.stored(),
        report.skipped(),
        report.failed(),
        if report.cancelled { " (cancelled)" } else { "" }
    );
}
