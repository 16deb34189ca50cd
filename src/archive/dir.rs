//! A plain directory treated as an archive: every regular file below it is an entry.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::ArchiveEntry;
use crate::engine::tools::{path_relative_to, path_to_entry_name};
use crate::error::ArchiveError;

use super::ArchiveSource;

pub struct DirSource {
    root: PathBuf,
    entries: Vec<ArchiveEntry>,
}

impl DirSource {
    /// Walk `root` (sorted by file name). Unreadable subtrees are logged and skipped.
    pub fn open(root: &Path) -> Result<Self, ArchiveError> {
        if !root.is_dir() {
            return Err(ArchiveError::Container {
                path: root.to_path_buf(),
                source: io::Error::new(io::ErrorKind::NotFound, "not a directory"),
            });
        }
        let mut entries = Vec::new();
        for result in WalkDir::new(root).sort_by_file_name() {
            let dent = match result {
                Ok(dent) => dent,
                Err(err) => {
                    log::warn!("skipping unreadable path: {}", err);
                    continue;
                }
            };
            if !dent.file_type().is_file() {
                continue;
            }
            let rel = path_relative_to(dent.path(), root).unwrap_or_else(|| dent.path().into());
            let size = dent.metadata().map(|m| m.len()).unwrap_or(0);
            entries.push(ArchiveEntry {
                name: path_to_entry_name(&rel),
                size,
                index: entries.len(),
            });
        }
        Ok(Self {
            root: root.to_path_buf(),
            entries,
        })
    }
}

impl ArchiveSource for DirSource {
    fn location(&self) -> &Path {
        &self.root
    }

    fn list_entries(&self) -> Vec<ArchiveEntry> {
        self.entries.clone()
    }

    fn open(&self, entry: &ArchiveEntry) -> Result<Box<dyn Read + Send>, ArchiveError> {
        let file = File::open(self.root.join(&entry.name)).map_err(|source| ArchiveError::Entry {
            name: entry.name.clone(),
            source,
        })?;
        Ok(Box::new(BufReader::new(file)))
    }
}
