//! Sort keys and ordering of listed entries

use super::entry::FilesystemEntry;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Field a listing is ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Case-sensitive byte order of the name
    #[default]
    Name,
    /// File size; directories count as zero
    Size,
    /// Creation time (falls back to modification time)
    #[value(alias = "time")]
    #[serde(alias = "time")]
    Created,
    /// Lower-cased extension; directories count as empty
    #[value(alias = "ext")]
    #[serde(alias = "ext")]
    Extension,
}

impl SortKey {
    pub fn compare(self, a: &FilesystemEntry, b: &FilesystemEntry) -> Ordering {
        match self {
            SortKey::Name => a.name.cmp(&b.name),
            SortKey::Size => a.sort_size().cmp(&b.sort_size()),
            SortKey::Created => a.creation_time_millis.cmp(&b.creation_time_millis),
            SortKey::Extension => a.extension.cmp(&b.extension),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::Size => "size",
            SortKey::Created => "created",
            SortKey::Extension => "extension",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn from_ascending(ascending: bool) -> Self {
        if ascending {
            SortOrder::Ascending
        } else {
            SortOrder::Descending
        }
    }

    pub fn is_ascending(self) -> bool {
        self == SortOrder::Ascending
    }
}

/// Sort entries in place
///
/// The ascending sort is stable, so equal keys keep enumeration order.
/// Descending reverses the whole ascending result, which also reverses the
/// order inside each group of equal keys.
pub fn sort_entries(entries: &mut [FilesystemEntry], key: SortKey, order: SortOrder) {
    entries.sort_by(|a, b| key.compare(a, b));
    if order == SortOrder::Descending {
        entries.reverse();
    }
}
