//! Public types for the fb2shelf API and pipeline.

use chrono::{DateTime, Utc};

use crate::error::{EntryFailure, ExtractionError};

/// Bibliographic metadata for one document (same shape as a row in the `books` table).
///
/// The title is validated on construction and cannot be replaced afterwards, so a
/// `Record` with a blank title never exists.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    title: String,
    pub authors: Vec<String>,
    pub genres: Vec<String>,
    pub language: String,
    pub annotation: String,
    pub cover: Option<Vec<u8>>,
    /// Entry name inside the archive. Unique key for upserts.
    pub entry_name: String,
    pub tags: Vec<String>,
    pub series: Option<String>,
    pub series_number: Option<i64>,
    /// Size of the source entry in bytes.
    pub size: u64,
    pub archive_path: String,
    pub date_added: DateTime<Utc>,
    /// Assigned by the store; `None` until persisted.
    pub id: Option<i64>,
}

impl Record {
    /// Build a record with the given title (trimmed). Fails if the title is blank.
    pub fn new(title: impl AsRef<str>) -> Result<Self, ExtractionError> {
        let title = title.as_ref().trim();
        if title.is_empty() {
            return Err(ExtractionError::MissingField("book-title"));
        }
        Ok(Self {
            title: title.to_string(),
            authors: Vec::new(),
            genres: Vec::new(),
            language: String::new(),
            annotation: String::new(),
            cover: None,
            entry_name: String::new(),
            tags: Vec::new(),
            series: None,
            series_number: None,
            size: 0,
            archive_path: String::new(),
            date_added: Utc::now(),
            id: None,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}

/// One named byte stream inside an archive. `index` is source-specific (zip index, listing position).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub size: u64,
    pub index: usize,
}

/// Final state of a single entry within a batch.
#[derive(Debug)]
pub enum EntryStatus {
    Stored { id: i64 },
    Skipped,
    Failed(EntryFailure),
}

#[derive(Debug)]
pub struct EntryOutcome {
    pub entry_name: String,
    pub status: EntryStatus,
}

impl EntryOutcome {
    pub fn is_stored(&self) -> bool {
        matches!(self.status, EntryStatus::Stored { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.status, EntryStatus::Skipped)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, EntryStatus::Failed(_))
    }
}

/// Result of one batch: every outcome observed, in arrival order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<EntryOutcome>,
    /// True when the cancel flag stopped the producer before the archive was exhausted.
    pub cancelled: bool,
}

impl BatchReport {
    pub fn stored(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_stored()).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_skipped()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failed()).count()
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// `(entry name, cause)` for every failed entry.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &EntryFailure)> {
        self.outcomes.iter().filter_map(|o| match &o.status {
            EntryStatus::Failed(cause) => Some((o.entry_name.as_str(), cause)),
            _ => None,
        })
    }

    /// Outcome for a given entry name, if the batch saw it.
    pub fn outcome(&self, entry_name: &str) -> Option<&EntryOutcome> {
        self.outcomes.iter().find(|o| o.entry_name == entry_name)
    }
}

/// Pipeline options. Defaults: 4 workers, `.fb2` suffix, channel capacity 64.
#[derive(Clone, Debug)]
pub struct IngestConfig {
    /// Number of worker threads (fixed for the batch; 0 is treated as 1).
    pub workers: usize,
    /// Recognized entry suffix, matched case-insensitively.
    pub suffix: String,
    /// Capacity of the work channel between producer and workers.
    pub channel_cap: usize,
}

impl IngestConfig {
    pub const DEFAULT_WORKERS: usize = 4;
    pub const DEFAULT_SUFFIX: &'static str = ".fb2";
    pub const DEFAULT_CHANNEL_CAP: usize = 64;
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            workers: Self::DEFAULT_WORKERS,
            suffix: Self::DEFAULT_SUFFIX.to_string(),
            channel_cap: Self::DEFAULT_CHANNEL_CAP,
        }
    }
}
