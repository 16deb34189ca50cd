//! Error types at the component seams. Application code wraps these in `anyhow`.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Archive container or entry could not be read.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The container itself is unusable. Fatal for a batch.
    #[error("cannot open archive {}: {source}", path.display())]
    Container {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A single entry is corrupt or unreadable.
    #[error("cannot open entry {name}: {source}")]
    Entry {
        name: String,
        #[source]
        source: io::Error,
    },
}

/// Raw bytes did not yield a valid record.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("malformed document: {0}")]
    Malformed(String),
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("cannot encode list column: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("record has no entry name")]
    MissingKey,
    #[error("invalid row {id}: {reason}")]
    InvalidRow { id: i64, reason: String },
    #[error("store assigned no id to {0}")]
    Unassigned(String),
    #[error("store connection lock poisoned")]
    Poisoned,
}

/// Why one entry ended up Failed. Contained at the worker boundary.
#[derive(Debug, Error)]
pub enum EntryFailure {
    #[error("open failed: {0}")]
    Open(ArchiveError),
    #[error("read failed: {0}")]
    Read(io::Error),
    #[error("extraction failed: {0}")]
    Extract(ExtractionError),
    #[error("store failed: {0}")]
    Store(StoreError),
}
