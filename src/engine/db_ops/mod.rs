//! Database operations: schema, open, record upsert and full scan.

mod connection;
mod store;

pub use connection::{open_db, open_db_in_memory};
pub use store::SqliteStore;

use crate::Record;
use crate::error::StoreError;

/// Upsert-by-entry-name persistence. Implementations provide their own
/// synchronization; callers may upsert from many threads at once.
pub trait RecordStore: Send + Sync {
    /// Insert, or overwrite every field but the id when the entry name already exists.
    /// Returns the record with its id assigned.
    fn upsert(&self, record: Record) -> Result<Record, StoreError>;

    /// Every stored record, ordered by id.
    fn list_all(&self) -> Result<Vec<Record>, StoreError>;
}

/// WAL tuning pragmas (synchronous, autocheckpoint, size limit). Use after PRAGMA journal_mode = WAL.
pub(crate) const WAL_PRAGMAS: &str = r#"
        PRAGMA synchronous = NORMAL;
        PRAGMA wal_autocheckpoint = 10000;
        PRAGMA journal_size_limit = 67108864;
        "#;

/// Schema for the books table. `file_name` holds the archive entry name (upsert key).
pub(crate) const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS books (
    book_id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    authors TEXT NOT NULL DEFAULT '[]',
    genres TEXT NOT NULL DEFAULT '[]',
    language TEXT NOT NULL DEFAULT '',
    annotation TEXT NOT NULL DEFAULT '',
    cover_data BLOB,
    file_name TEXT NOT NULL UNIQUE,
    tags TEXT NOT NULL DEFAULT '[]',
    series TEXT,
    series_number INTEGER,
    size INTEGER NOT NULL DEFAULT 0,
    archive_path TEXT NOT NULL DEFAULT '',
    date_added TEXT NOT NULL
);
"#;

/// Upsert keyed on file_name; every column except book_id is overwritten on conflict.
pub(crate) const UPSERT_BOOK_SQL: &str = r#"
INSERT INTO books (
    title, authors, genres, language, annotation, cover_data, file_name, tags,
    series, series_number, size, archive_path, date_added
)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
ON CONFLICT(file_name) DO UPDATE SET
    title = excluded.title,
    authors = excluded.authors,
    genres = excluded.genres,
    language = excluded.language,
    annotation = excluded.annotation,
    cover_data = excluded.cover_data,
    tags = excluded.tags,
    series = excluded.series,
    series_number = excluded.series_number,
    size = excluded.size,
    archive_path = excluded.archive_path,
    date_added = excluded.date_added
RETURNING book_id
"#;

pub(crate) const SELECT_BOOKS_SQL: &str = r#"
SELECT
    book_id, title, authors, genres, language, annotation, cover_data, file_name,
    tags, series, series_number, size, archive_path, date_added
FROM books
ORDER BY book_id
"#;
