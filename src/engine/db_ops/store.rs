//! SQLite-backed [`RecordStore`].

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row, params};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::Record;
use crate::error::StoreError;

use super::{RecordStore, SELECT_BOOKS_SQL, UPSERT_BOOK_SQL, open_db, open_db_in_memory};

/// One connection behind a mutex: workers upsert concurrently, SQLite sees one writer.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the database file at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wrap a connection that already has the schema applied.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Number of stored records.
    pub fn count(&self) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))?;
        Ok(n.max(0) as usize)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl RecordStore for SqliteStore {
    fn upsert(&self, mut record: Record) -> Result<Record, StoreError> {
        if record.entry_name.is_empty() {
            return Err(StoreError::MissingKey);
        }
        let authors = serde_json::to_string(&record.authors)?;
        let genres = serde_json::to_string(&record.genres)?;
        let tags = serde_json::to_string(&record.tags)?;

        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(UPSERT_BOOK_SQL)?;
        let id: i64 = stmt.query_row(
            params![
                record.title(),
                authors,
                genres,
                record.language,
                record.annotation,
                record.cover.as_deref(),
                record.entry_name,
                tags,
                record.series,
                record.series_number,
                record.size as i64,
                record.archive_path,
                record.date_added,
            ],
            |row| row.get(0),
        )?;
        record.id = Some(id);
        Ok(record)
    }

    fn list_all(&self) -> Result<Vec<Record>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(SELECT_BOOKS_SQL)?;
        let rows = stmt.query_map([], read_row)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row_to_record(row?)?);
        }
        Ok(records)
    }
}

/// Raw column values, before list decoding and title validation.
struct BookRow {
    id: i64,
    title: String,
    authors: String,
    genres: String,
    language: String,
    annotation: String,
    cover: Option<Vec<u8>>,
    file_name: String,
    tags: String,
    series: Option<String>,
    series_number: Option<i64>,
    size: i64,
    archive_path: String,
    date_added: DateTime<Utc>,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<BookRow> {
    Ok(BookRow {
        id: row.get(0)?,
        title: row.get(1)?,
        authors: row.get(2)?,
        genres: row.get(3)?,
        language: row.get(4)?,
        annotation: row.get(5)?,
        cover: row.get(6)?,
        file_name: row.get(7)?,
        tags: row.get(8)?,
        series: row.get(9)?,
        series_number: row.get(10)?,
        size: row.get(11)?,
        archive_path: row.get(12)?,
        date_added: row.get(13)?,
    })
}

fn decode_list(id: i64, column: &str, raw: &str) -> Result<Vec<String>, StoreError> {
    serde_json::from_str(raw).map_err(|e| StoreError::InvalidRow {
        id,
        reason: format!("{column}: {e}"),
    })
}

fn row_to_record(row: BookRow) -> Result<Record, StoreError> {
    let mut record = Record::new(&row.title).map_err(|e| StoreError::InvalidRow {
        id: row.id,
        reason: e.to_string(),
    })?;
    record.authors = decode_list(row.id, "authors", &row.authors)?;
    record.genres = decode_list(row.id, "genres", &row.genres)?;
    record.tags = decode_list(row.id, "tags", &row.tags)?;
    record.language = row.language;
    record.annotation = row.annotation;
    record.cover = row.cover;
    record.entry_name = row.file_name;
    record.series = row.series;
    record.series_number = row.series_number;
    record.size = row.size.max(0) as u64;
    record.archive_path = row.archive_path;
    record.date_added = row.date_added;
    record.id = Some(row.id);
    Ok(record)
}
