//! Ingestion pipeline: outcome accounting, failure isolation, idempotence, concurrency.

use fb2shelf::{
    EntryFailure, EntryStatus, ExtractionError, Fb2Extractor, IngestConfig, Pipeline, Record,
    RecordStore, SqliteStore, StoreError, ingest_archive,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

mod common;
use common::{MemSource, fb2_doc, numbered_books, write_zip};

fn config(workers: usize) -> IngestConfig {
    IngestConfig {
        workers,
        ..IngestConfig::default()
    }
}

fn run(source: &MemSource, store: &dyn RecordStore, workers: usize) -> fb2shelf::BatchReport {
    Pipeline::new(config(workers), &Fb2Extractor, store)
        .run(source)
        .unwrap()
}

/// Store that rejects any entry whose name contains "reject".
struct PickyStore(SqliteStore);

impl RecordStore for PickyStore {
    fn upsert(&self, record: Record) -> Result<Record, StoreError> {
        if record.entry_name.contains("reject") {
            return Err(StoreError::Unassigned(record.entry_name));
        }
        self.0.upsert(record)
    }

    fn list_all(&self) -> Result<Vec<Record>, StoreError> {
        self.0.list_all()
    }
}

/// Store that raises the cancel flag on its first upsert, then stalls long enough for the
/// producer to notice while blocked on a full channel.
struct CancellingStore {
    inner: SqliteStore,
    cancel: Arc<AtomicBool>,
}

impl RecordStore for CancellingStore {
    fn upsert(&self, record: Record) -> Result<Record, StoreError> {
        if !self.cancel.swap(true, Ordering::SeqCst) {
            std::thread::sleep(Duration::from_millis(600));
        }
        self.inner.upsert(record)
    }

    fn list_all(&self) -> Result<Vec<Record>, StoreError> {
        self.inner.list_all()
    }
}

#[test]
fn test_mixed_batch_outcomes() {
    let source = MemSource::new(vec![
        ("a.fb2".to_string(), fb2_doc("A", "").into_bytes()),
        ("b.fb2".to_string(), b"<not-closed".to_vec()),
        ("c.txt".to_string(), b"plain text".to_vec()),
    ]);
    let store = SqliteStore::open_in_memory().unwrap();
    let report = run(&source, &store, 4);

    assert_eq!(report.total(), 3);
    assert_eq!((report.stored(), report.failed(), report.skipped()), (1, 1, 1));
    assert!(report.outcome("a.fb2").unwrap().is_stored());
    assert!(matches!(
        report.outcome("b.fb2").unwrap().status,
        EntryStatus::Failed(EntryFailure::Extract(ExtractionError::Malformed(_)))
    ));
    assert!(report.outcome("c.txt").unwrap().is_skipped());
    assert!(!report.cancelled);

    let all = store.list_all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].title(), "A");
    assert_eq!(all[0].entry_name, "a.fb2");
    assert_eq!(all[0].archive_path, "memory.zip");
}

#[test]
fn test_stored_id_matches_store() {
    let source = MemSource::new(numbered_books(3));
    let store = SqliteStore::open_in_memory().unwrap();
    let report = run(&source, &store, 2);
    for record in store.list_all().unwrap() {
        match report.outcome(&record.entry_name).unwrap().status {
            EntryStatus::Stored { id } => assert_eq!(Some(id), record.id),
            ref other => panic!("unexpected status {other:?}"),
        }
    }
}

#[test]
fn test_rerun_is_idempotent() {
    let source = MemSource::new(numbered_books(5));
    let store = SqliteStore::open_in_memory().unwrap();
    run(&source, &store, 3);
    let first = store.list_all().unwrap();
    let report = run(&source, &store, 3);
    let second = store.list_all().unwrap();

    assert_eq!(report.stored(), 5);
    assert_eq!(first.len(), 5);
    assert_eq!(second.len(), 5);
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.title(), b.title());
        assert_eq!(a.entry_name, b.entry_name);
        assert_eq!(a.authors, b.authors);
        assert_eq!(a.size, b.size);
    }
}

#[test]
fn test_worker_count_does_not_change_result() {
    let mut entries = numbered_books(30);
    entries.push(("broken.fb2".to_string(), b"garbage".to_vec()));
    entries.push(("cover.jpg".to_string(), vec![0xFF, 0xD8]));
    let source = MemSource::new(entries);

    let snapshot = |workers: usize| {
        let store = SqliteStore::open_in_memory().unwrap();
        let report = run(&source, &store, workers);
        let rows: BTreeMap<String, String> = store
            .list_all()
            .unwrap()
            .into_iter()
            .map(|r| (r.entry_name.clone(), r.title().to_string()))
            .collect();
        (report.stored(), report.failed(), report.skipped(), rows)
    };

    let single = snapshot(1);
    let many = snapshot(8);
    assert_eq!(single, many);
    assert_eq!((single.0, single.1, single.2), (30, 1, 1));
}

#[test]
fn test_zero_workers_treated_as_one() {
    let source = MemSource::new(numbered_books(2));
    let store = SqliteStore::open_in_memory().unwrap();
    let report = run(&source, &store, 0);
    assert_eq!(report.stored(), 2);
}

#[test]
fn test_small_channel_many_entries() {
    let source = MemSource::new(numbered_books(40));
    let store = SqliteStore::open_in_memory().unwrap();
    let cfg = IngestConfig {
        workers: 3,
        channel_cap: 1,
        ..IngestConfig::default()
    };
    let report = Pipeline::new(cfg, &Fb2Extractor, &store)
        .run(&source)
        .unwrap();
    assert_eq!(report.stored(), 40);
    assert_eq!(store.count().unwrap(), 40);
}

#[test]
fn test_open_failure_is_isolated() {
    let source = MemSource::new(numbered_books(4)).with_broken("book-02.fb2");
    let store = SqliteStore::open_in_memory().unwrap();
    let report = run(&source, &store, 2);
    assert_eq!(report.stored(), 3);
    assert!(matches!(
        report.outcome("book-02.fb2").unwrap().status,
        EntryStatus::Failed(EntryFailure::Open(_))
    ));
    assert_eq!(store.count().unwrap(), 3);
}

#[test]
fn test_store_failure_is_isolated() {
    let mut entries = numbered_books(3);
    entries.push(("reject-me.fb2".to_string(), fb2_doc("Rejected", "").into_bytes()));
    let source = MemSource::new(entries);
    let store = PickyStore(SqliteStore::open_in_memory().unwrap());
    let report = run(&source, &store, 4);

    assert_eq!(report.stored(), 3);
    let failures: Vec<&str> = report.failures().map(|(name, _)| name).collect();
    assert_eq!(failures, vec!["reject-me.fb2"]);
    assert!(matches!(
        report.outcome("reject-me.fb2").unwrap().status,
        EntryStatus::Failed(EntryFailure::Store(_))
    ));
    assert_eq!(store.0.count().unwrap(), 3);
}

#[test]
fn test_blank_title_fails_entry() {
    let source = MemSource::new(vec![(
        "blank.fb2".to_string(),
        fb2_doc("  ", "").into_bytes(),
    )]);
    let store = SqliteStore::open_in_memory().unwrap();
    let report = run(&source, &store, 1);
    assert!(matches!(
        report.outcome("blank.fb2").unwrap().status,
        EntryStatus::Failed(EntryFailure::Extract(ExtractionError::MissingField(_)))
    ));
    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn test_hidden_and_unmatched_entries_skipped() {
    let mut entries = numbered_books(1);
    entries.push(("__MACOSX/._book-00.fb2".to_string(), b"\0\0".to_vec()));
    entries.push(("UPPER.FB2".to_string(), fb2_doc("Upper", "").into_bytes()));
    entries.push(("notes.md".to_string(), b"# notes".to_vec()));
    let source = MemSource::new(entries);
    let store = SqliteStore::open_in_memory().unwrap();
    let report = run(&source, &store, 2);
    assert_eq!(report.stored(), 2);
    assert_eq!(report.skipped(), 2);
    assert!(report.outcome("UPPER.FB2").unwrap().is_stored());
    assert!(report.outcome("__MACOSX/._book-00.fb2").unwrap().is_skipped());
}

#[test]
fn test_empty_source() {
    let source = MemSource::new(Vec::new());
    let store = SqliteStore::open_in_memory().unwrap();
    let report = run(&source, &store, 4);
    assert_eq!(report.total(), 0);
    assert!(!report.cancelled);
}

#[test]
fn test_callback_sees_every_outcome() {
    let mut entries = numbered_books(5);
    entries.push(("skip.txt".to_string(), Vec::new()));
    let source = MemSource::new(entries);
    let store = SqliteStore::open_in_memory().unwrap();
    let mut seen = Vec::new();
    let report = Pipeline::new(config(3), &Fb2Extractor, &store)
        .run_with(&source, |o| seen.push(o.entry_name.clone()))
        .unwrap();
    assert_eq!(seen.len(), report.total());
    assert_eq!(seen.len(), 6);
}

#[test]
fn test_cancel_flag_set_before_run() {
    let source = MemSource::new(numbered_books(10));
    let store = SqliteStore::open_in_memory().unwrap();
    let report = Pipeline::new(config(2), &Fb2Extractor, &store)
        .with_cancel_flag(Arc::new(AtomicBool::new(true)))
        .run(&source)
        .unwrap();
    assert!(report.cancelled);
    assert_eq!(report.total(), 0);
    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn test_unset_cancel_flag_runs_to_completion() {
    let source = MemSource::new(numbered_books(10));
    let store = SqliteStore::open_in_memory().unwrap();
    let report = Pipeline::new(config(2), &Fb2Extractor, &store)
        .with_cancel_flag(Arc::new(AtomicBool::new(false)))
        .run(&source)
        .unwrap();
    assert!(!report.cancelled);
    assert_eq!(report.stored(), 10);
}

#[test]
fn test_ingest_archive_from_zip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("library.zip");
    let doc = fb2_doc("Zipped", "");
    write_zip(
        &path,
        &[
            ("one.fb2", doc.as_bytes()),
            ("bad.fb2", "oops".as_bytes()),
            ("img.png", "png".as_bytes()),
        ],
    );
    let store = SqliteStore::open_in_memory().unwrap();
    let report = ingest_archive(&path, &store, &IngestConfig::default()).unwrap();
    assert_eq!((report.stored(), report.failed(), report.skipped()), (1, 1, 1));

    let stored = store.list_all().unwrap().remove(0);
    assert_eq!(stored.title(), "Zipped");
    assert_eq!(stored.size, doc.len() as u64);
    assert_eq!(stored.archive_path, path.display().to_string());
}

#[test]
fn test_same_entry_name_across_archives_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.zip");
    let second = dir.path().join("second.zip");
    write_zip(&first, &[("book.fb2", fb2_doc("Old", "").as_bytes())]);
    write_zip(&second, &[("book.fb2", fb2_doc("New", "").as_bytes())]);

    let store = SqliteStore::open_in_memory().unwrap();
    ingest_archive(&first, &store, &IngestConfig::default()).unwrap();
    ingest_archive(&second, &store, &IngestConfig::default()).unwrap();

    let all = store.list_all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].title(), "New");
    assert_eq!(all[0].archive_path, second.display().to_string());
}

#[test]
fn test_ingest_archive_unopenable_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open_in_memory().unwrap();
    let missing = dir.path().join("missing.zip");
    assert!(ingest_archive(&missing, &store, &IngestConfig::default()).is_err());

    let not_zip = dir.path().join("bogus.zip");
    std::fs::write(&not_zip, b"nope").unwrap();
    assert!(ingest_archive(&not_zip, &store, &IngestConfig::default()).is_err());
    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn test_changed_entry_updates_row_in_place() {
    let store = SqliteStore::open_in_memory().unwrap();
    let before = MemSource::new(vec![(
        "a.fb2".to_string(),
        fb2_doc("Foo", "").into_bytes(),
    )]);
    run(&before, &store, 2);
    let id = store.list_all().unwrap()[0].id;

    let after = MemSource::new(vec![(
        "a.fb2".to_string(),
        fb2_doc("Foo, Second Edition", "").into_bytes(),
    )]);
    run(&after, &store, 2);
    let all = store.list_all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, id);
    assert_eq!(all[0].title(), "Foo, Second Edition");
}

#[test]
fn test_cancel_mid_batch_drains_enqueued_entries() {
    let source = MemSource::new(numbered_books(20));
    let cancel = Arc::new(AtomicBool::new(false));
    let store = CancellingStore {
        inner: SqliteStore::open_in_memory().unwrap(),
        cancel: Arc::clone(&cancel),
    };
    let cfg = IngestConfig {
        workers: 1,
        channel_cap: 1,
        ..IngestConfig::default()
    };
    let report = Pipeline::new(cfg, &Fb2Extractor, &store)
        .with_cancel_flag(Arc::clone(&cancel))
        .run(&source)
        .unwrap();

    assert!(report.cancelled);
    assert_eq!(report.skipped(), 0);
    // One entry in the worker, at most one in the channel, at most one handed over as the flag rose.
    let finished = report.stored() + report.failed();
    assert_eq!(finished, report.total());
    assert!(finished >= 1 && finished < 20, "finished {finished} of 20");

    let rows = store.inner.list_all().unwrap();
    assert_eq!(rows.len(), report.stored());
    for row in rows {
        assert!(report.outcome(&row.entry_name).unwrap().is_stored());
    }
    assert!(report.outcome("book-19.fb2").is_none());
}

#[test]
fn test_os_clutter_with_suffix_is_skipped() {
    let mut entries = numbered_books(1);
    entries.push((
        "__MACOSX/book-00.fb2".to_string(),
        fb2_doc("Resource Fork", "").into_bytes(),
    ));
    entries.push(("dir/._book.fb2".to_string(), fb2_doc("Dot Underscore", "").into_bytes()));
    let source = MemSource::new(entries);
    let store = SqliteStore::open_in_memory().unwrap();
    let report = run(&source, &store, 2);
    assert_eq!((report.stored(), report.skipped(), report.failed()), (1, 2, 0));
    assert!(report.outcome("__MACOSX/book-00.fb2").unwrap().is_skipped());
    assert!(report.outcome("dir/._book.fb2").unwrap().is_skipped());
    assert_eq!(store.count().unwrap(), 1);
}
