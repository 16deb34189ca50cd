//! Zip archives, memory-mapped once and shared by all workers.

use memmap2::Mmap;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use zip::ZipArchive;

use crate::ArchiveEntry;
use crate::error::ArchiveError;
use crate::utils::config::MAX_ENTRY_PREALLOC;

use super::ArchiveSource;

/// Read-only mapping that can back any number of cursors.
#[derive(Clone)]
struct SharedMap(Arc<Mmap>);

impl AsRef<[u8]> for SharedMap {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Zip archive on disk. The central directory is parsed once in [`ZipSource::open`];
/// each [`ArchiveSource::open`] works on a cheap clone so workers never share a cursor.
pub struct ZipSource {
    path: PathBuf,
    archive: ZipArchive<Cursor<SharedMap>>,
    entries: Vec<ArchiveEntry>,
}

impl ZipSource {
    /// Map the file and read its central directory. Fails if the file is missing or not a zip.
    pub fn open(path: &Path) -> Result<Self, ArchiveError> {
        let container = |source: io::Error| ArchiveError::Container {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(container)?;
        // Safety: mapped read-only; the archive must not be modified while a batch runs.
        let map = unsafe { Mmap::map(&file) }.map_err(container)?;
        let mut archive = ZipArchive::new(Cursor::new(SharedMap(Arc::new(map))))
            .map_err(|e| container(e.into()))?;

        let mut entries = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let file = archive
                .by_index_raw(index)
                .map_err(|e| container(e.into()))?;
            if file.is_dir() {
                continue;
            }
            entries.push(ArchiveEntry {
                name: file.name().to_string(),
                size: file.size(),
                index,
            });
        }
        log::debug!("{}: {} entries", path.display(), entries.len());

        Ok(Self {
            path: path.to_path_buf(),
            archive,
            entries,
        })
    }
}

impl ArchiveSource for ZipSource {
    fn location(&self) -> &Path {
        &self.path
    }

    fn list_entries(&self) -> Vec<ArchiveEntry> {
        self.entries.clone()
    }

    /// Inflates the entry into memory; the returned reader is detached from the archive.
    fn open(&self, entry: &ArchiveEntry) -> Result<Box<dyn Read + Send>, ArchiveError> {
        let entry_err = |source: io::Error| ArchiveError::Entry {
            name: entry.name.clone(),
            source,
        };
        let mut archive = self.archive.clone();
        let mut file = archive
            .by_index(entry.index)
            .map_err(|e| entry_err(e.into()))?;
        let mut buf = Vec::with_capacity(entry.size.min(MAX_ENTRY_PREALLOC) as usize);
        file.read_to_end(&mut buf).map_err(entry_err)?;
        Ok(Box::new(Cursor::new(buf)))
    }
}
