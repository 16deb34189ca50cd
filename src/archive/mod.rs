//! Archive sources: enumerate named entries and open them as byte streams.

mod dir;
mod zipfile;

pub use dir::DirSource;
pub use zipfile::ZipSource;

use std::io::Read;
use std::path::Path;

use crate::ArchiveEntry;
use crate::error::ArchiveError;

/// A container of named entries. Shared by reference across workers, so every
/// `open` must be independently safe.
pub trait ArchiveSource: Sync {
    /// Where the container lives.
    fn location(&self) -> &Path;

    /// Entries in container order. Directories are not listed.
    fn list_entries(&self) -> Vec<ArchiveEntry>;

    /// Open one entry for reading. Fails if the entry is corrupt or unreadable.
    fn open(&self, entry: &ArchiveEntry) -> Result<Box<dyn Read + Send>, ArchiveError>;
}

/// Open `path` as a directory source when it is a directory, as a zip archive otherwise.
pub fn open_source(path: &Path) -> Result<Box<dyn ArchiveSource>, ArchiveError> {
    if path.is_dir() {
        Ok(Box::new(DirSource::open(path)?))
    } else {
        Ok(Box::new(ZipSource::open(path)?))
    }
}
