//! Pipeline channels and the read-only context shared by every worker.

use crossbeam_channel::{Receiver, Sender, bounded, unbounded};

use crate::archive::ArchiveSource;
use crate::engine::MetadataExtractor;
use crate::engine::db_ops::RecordStore;
use crate::{ArchiveEntry, EntryOutcome};

/// Everything a worker needs besides its loop variable. Immutable for the whole batch.
pub struct WorkerContext<'a, A: ?Sized> {
    pub source: &'a A,
    pub extractor: &'a dyn MetadataExtractor,
    pub store: &'a dyn RecordStore,
    /// Copied into every record's `archive_path`.
    pub archive_path: String,
}

impl<'a, A: ArchiveSource + ?Sized> WorkerContext<'a, A> {
    pub fn new(
        source: &'a A,
        extractor: &'a dyn MetadataExtractor,
        store: &'a dyn RecordStore,
    ) -> Self {
        Self {
            source,
            extractor,
            store,
            archive_path: source.location().display().to_string(),
        }
    }
}

/// Work channel (producer → workers, bounded) and outcome channel (producer and workers → caller).
/// Producer gets work_tx and a clone of outcome_tx; workers get work_rx and outcome_tx clones.
pub struct PipelineChannels {
    pub work_tx: Sender<ArchiveEntry>,
    pub work_rx: Receiver<ArchiveEntry>,
    pub outcome_tx: Sender<EntryOutcome>,
    pub outcome_rx: Receiver<EntryOutcome>,
}

/// Outcomes are unbounded so a worker never waits on the caller.
pub fn create_pipeline_channels(channel_cap: usize) -> PipelineChannels {
    let (work_tx, work_rx) = bounded::<ArchiveEntry>(channel_cap);
    let (outcome_tx, outcome_rx) = unbounded::<EntryOutcome>();
    PipelineChannels {
        work_tx,
        work_rx,
        outcome_tx,
        outcome_rx,
    }
}
