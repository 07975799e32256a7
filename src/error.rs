//! Error types shared by the fingerprint store and the directory lister

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A file could not be opened or a read failed part way through
    #[error("I/O failure on {}: {source}", path.display())]
    IoFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The fingerprint table could not be read or written
    #[error("Fingerprint database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A directory is missing, is not a directory, or cannot be enumerated
    #[error("Directory not readable: {}: {source}", path.display())]
    NotReadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Error::IoFailure {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn not_readable(path: &Path, source: std::io::Error) -> Self {
        Error::NotReadable {
            path: path.to_path_buf(),
            source,
        }
    }

    /// File and database failures both count as I/O failures for callers
    pub fn is_io_failure(&self) -> bool {
        matches!(self, Error::IoFailure { .. } | Error::Database(_))
    }

    pub fn is_not_readable(&self) -> bool {
        matches!(self, Error::NotReadable { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
