//! fb2shelf: concurrent FB2 library importer.
//!
//! Reads every recognized document in an archive (zip file or directory) on a pool of
//! worker threads, extracts its bibliographic metadata and upserts it into a SQLite
//! library keyed by entry name. The library can then be exported as Hugo page bundles.
//!
//! ```ignore
//! let store = fb2shelf::SqliteStore::open(Path::new("library.db"))?;
//! let report = fb2shelf::ingest_archive(Path::new("books.zip"), &store, &Default::default())?;
//! println!("{} stored, {} failed", report.stored(), report.failed());
//! fb2shelf::export_site(&store.list_all()?, Path::new("site"))?;
//! ```

pub mod archive;
pub mod engine;
pub mod error;
pub mod export;
pub mod ingest;
pub mod pipeline;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

pub use archive::{ArchiveSource, DirSource, ZipSource, open_source};
pub use engine::{Fb2Extractor, MetadataExtractor, RecordStore, SqliteStore, parse_fb2};
pub use error::{ArchiveError, EntryFailure, ExtractionError, StoreError};
pub use export::{export_from_store, export_site};
pub use pipeline::{Pipeline, ingest_archive};

/// Result alias used by the public fb2shelf API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;
