//! Worker loop: open → read → extract → upsert, one entry at a time.

use chrono::Utc;
use crossbeam_channel::{Receiver, Sender};
use log::{debug, warn};
use std::io::Read;
use std::thread::{Scope, ScopedJoinHandle};

use crate::archive::ArchiveSource;
use crate::error::{EntryFailure, StoreError};
use crate::utils::config::MAX_ENTRY_PREALLOC;
use crate::{ArchiveEntry, EntryOutcome, EntryStatus};

use super::context::WorkerContext;

/// Take one entry from Pending to Stored. Any failing step ends it as Failed with that step's cause.
pub fn process_entry<A: ArchiveSource + ?Sized>(
    entry: &ArchiveEntry,
    ctx: &WorkerContext<'_, A>,
) -> Result<i64, EntryFailure> {
    let mut reader = ctx.source.open(entry).map_err(EntryFailure::Open)?;
    let mut bytes = Vec::with_capacity(entry.size.min(MAX_ENTRY_PREALLOC) as usize);
    reader.read_to_end(&mut bytes).map_err(EntryFailure::Read)?;
    drop(reader);

    let mut record = ctx.extractor.extract(&bytes).map_err(EntryFailure::Extract)?;
    record.entry_name = entry.name.clone();
    record.size = bytes.len() as u64;
    record.archive_path = ctx.archive_path.clone();
    record.date_added = Utc::now();
    drop(bytes);

    let stored = ctx.store.upsert(record).map_err(EntryFailure::Store)?;
    stored
        .id
        .ok_or_else(|| EntryFailure::Store(StoreError::Unassigned(entry.name.clone())))
}

/// Single worker: pull entries until the work channel closes, report each outcome.
/// Failures are logged here and never leave the worker.
fn worker_loop<A: ArchiveSource + ?Sized>(
    worker_id: usize,
    work_rx: Receiver<ArchiveEntry>,
    outcome_tx: Sender<EntryOutcome>,
    ctx: &WorkerContext<'_, A>,
) {
    while let Ok(entry) = work_rx.recv() {
        let status = match process_entry(&entry, ctx) {
            Ok(id) => {
                debug!("worker {worker_id}: stored {} (id {id})", entry.name);
                EntryStatus::Stored { id }
            }
            Err(failure) => {
                warn!("worker {worker_id}: {}: {failure}", entry.name);
                EntryStatus::Failed(failure)
            }
        };
        let _ = outcome_tx.send(EntryOutcome {
            entry_name: entry.name,
            status,
        });
    }
}

/// Spawn `num_workers` workers sharing `work_rx`. Each entry is delivered to exactly one of them.
pub fn spawn_workers<'scope, 'env, A: ArchiveSource + ?Sized>(
    scope: &'scope Scope<'scope, 'env>,
    work_rx: Receiver<ArchiveEntry>,
    outcome_tx: &Sender<EntryOutcome>,
    ctx: &'env WorkerContext<'env, A>,
    num_workers: usize,
) -> Vec<ScopedJoinHandle<'scope, ()>> {
    (0..num_workers)
        .map(|worker_id| {
            let work_rx = work_rx.clone();
            let outcome_tx = outcome_tx.clone();
            scope.spawn(move || worker_loop(worker_id, work_rx, outcome_tx, ctx))
        })
        .collect()
}
