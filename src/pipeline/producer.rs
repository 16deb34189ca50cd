//! Producer loop: enumerate entries once, skip unrecognized ones, feed the rest to workers.

use crossbeam_channel::{SendTimeoutError, Sender};
use log::trace;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{Scope, ScopedJoinHandle};

use crate::engine::tools::is_recognized_entry;
use crate::utils::config::CANCEL_POLL_INTERVAL;
use crate::{ArchiveEntry, EntryOutcome, EntryStatus};

/// What the producer did with the entry list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProducerSummary {
    pub enqueued: usize,
    pub skipped: usize,
    /// Stopped early because the cancel flag was set.
    pub cancelled: bool,
}

fn is_cancelled(cancel: Option<&AtomicBool>) -> bool {
    cancel.is_some_and(|c| c.load(Ordering::Relaxed))
}

/// Send `entry`, waking up periodically to look at the cancel flag while the channel is full.
/// Returns false when the entry was not delivered (cancelled, or every worker is gone).
fn send_entry(
    work_tx: &Sender<ArchiveEntry>,
    entry: ArchiveEntry,
    cancel: Option<&AtomicBool>,
) -> bool {
    if cancel.is_none() {
        return work_tx.send(entry).is_ok();
    }
    let mut entry = entry;
    loop {
        match work_tx.send_timeout(entry, CANCEL_POLL_INTERVAL) {
            Ok(()) => return true,
            Err(SendTimeoutError::Timeout(back)) => {
                if is_cancelled(cancel) {
                    return false;
                }
                entry = back;
            }
            Err(SendTimeoutError::Disconnected(_)) => return false,
        }
    }
}

/// Run the producer: non-matching entries become Skipped outcomes and are never enqueued;
/// the rest go to `work_tx` in archive order. Drops `work_tx` when done so workers drain and exit.
pub fn run_producer(
    entries: Vec<ArchiveEntry>,
    work_tx: Sender<ArchiveEntry>,
    outcome_tx: Sender<EntryOutcome>,
    suffix: &str,
    cancel: Option<&AtomicBool>,
) -> ProducerSummary {
    let mut summary = ProducerSummary::default();
    for entry in entries {
        if is_cancelled(cancel) {
            summary.cancelled = true;
            break;
        }
        if !is_recognized_entry(&entry.name, suffix) {
            trace!("skip {}", entry.name);
            summary.skipped += 1;
            let _ = outcome_tx.send(EntryOutcome {
                entry_name: entry.name,
                status: EntryStatus::Skipped,
            });
            continue;
        }
        if !send_entry(&work_tx, entry, cancel) {
            summary.cancelled = is_cancelled(cancel);
            break;
        }
        summary.enqueued += 1;
    }
    drop(work_tx);
    summary
}

pub fn spawn_producer<'scope, 'env>(
    scope: &'scope Scope<'scope, 'env>,
    entries: Vec<ArchiveEntry>,
    work_tx: Sender<ArchiveEntry>,
    outcome_tx: Sender<EntryOutcome>,
    suffix: &'env str,
    cancel: Option<&'env AtomicBool>,
) -> ScopedJoinHandle<'scope, ProducerSummary> {
    scope.spawn(move || run_producer(entries, work_tx, outcome_tx, suffix, cancel))
}
