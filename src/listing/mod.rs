//! Directory listing and ordering
//!
//! Enumerates the immediate children of a directory and orders them by a
//! caller-chosen key. Every call reads the filesystem afresh; nothing is cached.

pub mod entry;
pub mod sort;

pub use entry::FilesystemEntry;
pub use sort::{sort_entries, SortKey, SortOrder};

use crate::error::{Error, Result};
use std::fs;
use std::io;
use std::path::Path;

/// Filters applied while enumerating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListOptions {
    /// Include entries whose name starts with `.`
    pub show_hidden: bool,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self { show_hidden: true }
    }
}

/// List the immediate children of `dir`, ordered by `key` and `order`
///
/// An empty directory yields an empty listing. A missing path, a path that is
/// not a directory, or a directory that cannot be enumerated yields
/// [`Error::NotReadable`].
pub fn list(dir: &Path, key: SortKey, order: SortOrder) -> Result<Vec<FilesystemEntry>> {
    list_with_options(dir, key, order, ListOptions::default())
}

pub fn list_with_options(
    dir: &Path,
    key: SortKey,
    order: SortOrder,
    options: ListOptions,
) -> Result<Vec<FilesystemEntry>> {
    let mut entries = read_entries(dir, options)?;
    sort_entries(&mut entries, key, order);
    Ok(entries)
}

/// Enumerate children in the order the filesystem returns them
fn read_entries(dir: &Path, options: ListOptions) -> Result<Vec<FilesystemEntry>> {
    let dir = fs::canonicalize(dir).map_err(|e| Error::not_readable(dir, e))?;

    let metadata = fs::metadata(&dir).map_err(|e| Error::not_readable(&dir, e))?;
    if !metadata.is_dir() {
        return Err(Error::not_readable(
            &dir,
            io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
        ));
    }

    let read_dir = fs::read_dir(&dir).map_err(|e| Error::not_readable(&dir, e))?;

    let mut entries = Vec::new();
    for dir_entry in read_dir {
        let dir_entry = dir_entry.map_err(|e| Error::not_readable(&dir, e))?;
        let name = dir_entry.file_name();
        if !options.show_hidden && name.to_string_lossy().starts_with('.') {
            continue;
        }

        let path = dir.join(&name);
        let metadata = match child_metadata(&path) {
            Ok(m) => Some(m),
            Err(e) => {
                log::debug!("Listing {} without metadata: {}", path.display(), e);
                None
            }
        };
        entries.push(FilesystemEntry::from_metadata(path, metadata.as_ref()));
    }

    log::debug!("Listed {} entries in {}", entries.len(), dir.display());
    Ok(entries)
}

/// Metadata following symlinks, or of the link itself when the target is gone
fn child_metadata(path: &Path) -> io::Result<fs::Metadata> {
    match fs::metadata(path) {
        Ok(m) => Ok(m),
        Err(_) => fs::symlink_metadata(path),
    }
}
