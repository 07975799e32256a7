//! Browsing sessions
//!
//! A session lists directories, flags files whose content changed since they
//! were last recorded, and remembers every file it showed. Finishing the
//! session records the current hash of each of those files so the next
//! session compares against present content.

use crate::error::Result;
use crate::fingerprint::{ChangeStatus, FingerprintStore};
use crate::listing::{self, FilesystemEntry, ListOptions, SortKey, SortOrder};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// A listed entry with its change status (`None` unless it is a regular file)
#[derive(Debug, Clone, Serialize)]
pub struct ListingRow {
    #[serde(flatten)]
    pub entry: FilesystemEntry,
    pub status: Option<ChangeStatus>,
}

impl ListingRow {
    pub fn is_changed(&self) -> bool {
        self.status.map(ChangeStatus::is_changed).unwrap_or(false)
    }
}

/// Counters for a finished session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub visited: usize,
    pub recorded: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub stats: SessionStats,
}

pub struct BrowseSession<'a> {
    store: &'a FingerprintStore,
    options: ListOptions,
    started_at: DateTime<Utc>,
    visited: Vec<PathBuf>,
    seen: HashSet<PathBuf>,
}

impl<'a> BrowseSession<'a> {
    pub fn new(store: &'a FingerprintStore) -> Self {
        Self::with_options(store, ListOptions::default())
    }

    pub fn with_options(store: &'a FingerprintStore, options: ListOptions) -> Self {
        Self {
            store,
            options,
            started_at: Utc::now(),
            visited: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// List a directory and flag each regular file against the store
    ///
    /// Directories, pipes, sockets and devices are listed but never tracked.
    pub fn browse(&mut self, dir: &Path, key: SortKey, order: SortOrder) -> Result<Vec<ListingRow>> {
        let entries = listing::list_with_options(dir, key, order, self.options)?;

        for entry in entries.iter().filter(|e| e.is_file()) {
            if self.seen.insert(entry.path.clone()) {
                self.visited.push(entry.path.clone());
            }
        }

        let store = self.store;
        Ok(entries
            .into_par_iter()
            .map(|entry| {
                let status = entry.is_file().then(|| store.status(&entry.path));
                ListingRow { entry, status }
            })
            .collect())
    }

    /// Files shown so far, in first-seen order
    pub fn visited(&self) -> &[PathBuf] {
        &self.visited
    }

    /// Record the current hash of every visited file
    ///
    /// Files that cannot be hashed are counted as failed and keep their
    /// previous record.
    pub fn finish(self) -> Result<SessionSummary> {
        let results = self.store.record_many(&self.visited)?;

        let mut stats = SessionStats {
            visited: self.visited.len(),
            ..SessionStats::default()
        };
        for (path, result) in &results {
            match result {
                Ok(_) => stats.recorded += 1,
                Err(e) => {
                    stats.failed += 1;
                    log::warn!("Could not record {}: {}", path.display(), e);
                }
            }
        }

        log::info!(
            "Session finished: {} visited, {} recorded, {} failed",
            stats.visited,
            stats.recorded,
            stats.failed
        );

        Ok(SessionSummary {
            started_at: self.started_at,
            finished_at: Utc::now(),
            stats,
        })
    }

    /// End the session without recording anything
    pub fn abandon(self) -> SessionStats {
        SessionStats {
            visited: self.visited.len(),
            ..SessionStats::default()
        }
    }
}
