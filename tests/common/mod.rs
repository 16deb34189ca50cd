//! Shared fixtures: FB2 documents, zip archives, in-memory archive sources.

#![allow(dead_code)]

use fb2shelf::{ArchiveEntry, ArchiveError, ArchiveSource};
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, Cursor, Read, Write};
use std::path::{Path, PathBuf};

/// Minimal FB2 document; `title_info_extra` is inserted after `book-title`.
pub fn fb2_doc(title: &str, title_info_extra: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<FictionBook xmlns="http://www.gribuser.ru/xml/fictionbook/2.0" xmlns:l="http://www.w3.org/1999/xlink">
  <description>
    <title-info>
      <genre>fiction</genre>
      <author><first-name>Test</first-name><last-name>Author</last-name></author>
      <book-title>{title}</book-title>
      {title_info_extra}
      <lang>en</lang>
    </title-info>
  </description>
  <body><section><p>Body text.</p></section></body>
</FictionBook>
"#
    )
}

/// Write a zip at `path` with the given (name, bytes) entries, in order.
pub fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
    let options = zip::write::SimpleFileOptions::default();
    for (name, bytes) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(bytes).unwrap();
    }
    zip.finish().unwrap();
}

/// Archive held in memory. Entries named in `broken` fail on open.
pub struct MemSource {
    pub path: PathBuf,
    pub entries: Vec<(String, Vec<u8>)>,
    pub broken: HashSet<String>,
}

impl MemSource {
    pub fn new(entries: Vec<(String, Vec<u8>)>) -> Self {
        Self {
            path: PathBuf::from("memory.zip"),
            entries,
            broken: HashSet::new(),
        }
    }

    pub fn with_broken(mut self, name: &str) -> Self {
        self.broken.insert(name.to_string());
        self
    }
}

impl ArchiveSource for MemSource {
    fn location(&self) -> &Path {
        &self.path
    }

    fn list_entries(&self) -> Vec<ArchiveEntry> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, (name, bytes))| ArchiveEntry {
                name: name.clone(),
                size: bytes.len() as u64,
                index,
            })
            .collect()
    }

    fn open(&self, entry: &ArchiveEntry) -> Result<Box<dyn Read + Send>, ArchiveError> {
        if self.broken.contains(&entry.name) {
            return Err(ArchiveError::Entry {
                name: entry.name.clone(),
                source: io::Error::new(io::ErrorKind::InvalidData, "corrupt entry"),
            });
        }
        Ok(Box::new(Cursor::new(self.entries[entry.index].1.clone())))
    }
}

/// `n` valid documents named `book-00.fb2`, `book-01.fb2`, ...
pub fn numbered_books(n: usize) -> Vec<(String, Vec<u8>)> {
    (0..n)
        .map(|i| {
            (
                format!("book-{i:02}.fb2"),
                fb2_doc(&format!("Book {i}"), "").into_bytes(),
            )
        })
        .collect()
}
