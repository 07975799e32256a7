//! SQLite-backed fingerprint store
//!
//! One table, one row per canonical path:
//!
//! ```text
//! file_hashes(path TEXT PRIMARY KEY, hash TEXT NOT NULL)
//! ```
//!
//! The schema version lives in `PRAGMA user_version`. On mismatch the table is
//! dropped and recreated; the store is a derived cache, not a source of truth.

use crate::config::{Config, DEFAULT_CHUNK_SIZE};
use crate::error::{Error, Result};
use crate::fingerprint::hasher;
use crate::fingerprint::status::ChangeStatus;
use crate::listing::FilesystemEntry;
use rayon::prelude::*;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

const SCHEMA_VERSION: i32 = 1;
const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(30);
/// Symlink hops followed when resolving a key for a dangling link
const MAX_LINK_DEPTH: usize = 40;

/// A stored fingerprint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FingerprintRecord {
    pub path: String,
    pub hash: String,
}

/// Persistent map from canonical path to last recorded content hash
///
/// Safe to share between threads. Hashing runs outside the connection lock,
/// so different paths hash in parallel. Writers of the same path are
/// serialised from hash to commit: the stored hash is always the content the
/// last committed writer read, never an older read committed late.
pub struct FingerprintStore {
    db: Mutex<Connection>,
    path_locks: Mutex<HashMap<String, Weak<Mutex<()>>>>,
    db_path: PathBuf,
    chunk_size: usize,
}

impl FingerprintStore {
    /// Open or create the store at `db_path` with default settings
    pub fn open(db_path: &Path) -> Result<Self> {
        Self::open_with(db_path, DEFAULT_CHUNK_SIZE, DEFAULT_BUSY_TIMEOUT)
    }

    /// Open the store described by the configuration
    pub fn open_with_config(config: &Config) -> Result<Self> {
        Self::open_with(
            &config.database_path()?,
            config.chunk_size(),
            Duration::from_secs(config.store.busy_timeout_secs),
        )
    }

    pub fn open_with(db_path: &Path, chunk_size: usize, busy_timeout: Duration) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }

        let db = match Self::connect(db_path, busy_timeout) {
            Ok(db) => db,
            Err(e) => {
                log::warn!(
                    "Failed to initialise fingerprint database {}: {}. Recreating it",
                    db_path.display(),
                    e
                );
                let backup_path = db_path.with_extension("db.backup");
                if let Err(e) = fs::copy(db_path, &backup_path) {
                    log::debug!("Could not back up {}: {}", db_path.display(), e);
                }
                remove_database_files(db_path);
                Self::connect(db_path, busy_timeout)?
            }
        };

        log::debug!("Opened fingerprint database {}", db_path.display());
        Ok(Self {
            db: Mutex::new(db),
            path_locks: Mutex::new(HashMap::new()),
            db_path: db_path.to_path_buf(),
            chunk_size: chunk_size.max(1),
        })
    }

    fn connect(db_path: &Path, busy_timeout: Duration) -> rusqlite::Result<Connection> {
        let mut db = Connection::open(db_path)?;
        // WAL lets lookups proceed while a write is in progress
        db.pragma_update(None, "journal_mode", "WAL")?;
        db.busy_timeout(busy_timeout)?;
        init_schema(&mut db)?;
        Ok(db)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.db.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Lock guarding hash-then-write for one key; shared while anyone holds it
    fn path_lock(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.path_locks.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(lock) = locks.get(key).and_then(Weak::upgrade) {
            return lock;
        }
        locks.retain(|_, lock| lock.strong_count() > 0);
        let lock = Arc::new(Mutex::new(()));
        locks.insert(key.to_string(), Arc::downgrade(&lock));
        lock
    }

    /// Hash the current content of a file
    pub fn compute_hash(&self, path: &Path) -> Result<String> {
        hasher::compute_hash_chunked(path, self.chunk_size)
    }

    /// Stored hash for a path, or `None` if nothing was recorded
    ///
    /// Database failures are logged and reported as a missing record.
    pub fn lookup(&self, path: &Path) -> Option<String> {
        let key = canonical_key(path);
        let result = self
            .conn()
            .query_row(
                "SELECT hash FROM file_hashes WHERE path = ?1",
                [&key],
                |row| row.get::<_, String>(0),
            )
            .optional();

        match result {
            Ok(hash) => hash,
            Err(e) => {
                log::warn!("Fingerprint lookup failed for {}: {}", key, e);
                None
            }
        }
    }

    /// Hash a file and insert or replace its record, returning the new hash
    ///
    /// If hashing fails nothing is written and the previous record survives.
    /// Concurrent upserts of the same path run one after another, each hashing
    /// the content present once the previous one committed.
    pub fn upsert(&self, path: &Path) -> Result<String> {
        let key = canonical_key(path);
        let lock = self.path_lock(&key);
        let _held = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let hash = self.compute_hash(path)?;
        self.conn().execute(
            "INSERT INTO file_hashes (path, hash) VALUES (?1, ?2)
             ON CONFLICT(path) DO UPDATE SET hash = excluded.hash",
            params![key, hash],
        )?;
        log::trace!("Recorded {} -> {}", key, hash);
        Ok(hash)
    }

    /// Compare the current content of a file against its stored hash
    pub fn status(&self, path: &Path) -> ChangeStatus {
        let Some(stored) = self.lookup(path) else {
            return ChangeStatus::Untracked;
        };
        match self.compute_hash(path) {
            Ok(current) if current == stored => ChangeStatus::Unchanged,
            Ok(_) => ChangeStatus::Changed,
            Err(e) => {
                log::warn!("Cannot determine whether {} changed: {}", path.display(), e);
                ChangeStatus::Unknown
            }
        }
    }

    /// True only when a record exists and the current hash differs from it
    ///
    /// Untracked files and files that cannot be hashed report `false`.
    pub fn has_changed(&self, path: &Path) -> bool {
        self.status(path).is_changed()
    }

    /// Record many files at once
    ///
    /// Hashes are computed in parallel, then every successful hash is written
    /// in one transaction. Per-file hashing failures are returned alongside the
    /// successes; a database failure fails the whole batch.
    pub fn record_many(&self, paths: &[PathBuf]) -> Result<Vec<(PathBuf, Result<String>)>> {
        let keys: Vec<String> = paths.par_iter().map(|path| canonical_key(path)).collect();

        // Sorted and deduplicated so two batches can never wait on each other
        let unique: BTreeSet<&str> = keys.iter().map(String::as_str).collect();
        let locks: Vec<Arc<Mutex<()>>> = unique.into_iter().map(|key| self.path_lock(key)).collect();
        let _held: Vec<MutexGuard<'_, ()>> = locks
            .iter()
            .map(|lock| lock.lock().unwrap_or_else(PoisonError::into_inner))
            .collect();

        let hashed: Vec<(PathBuf, String, Result<String>)> = paths
            .par_iter()
            .zip(keys.par_iter())
            .map(|(path, key)| (path.clone(), key.clone(), self.compute_hash(path)))
            .collect();

        {
            let mut conn = self.conn();
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO file_hashes (path, hash) VALUES (?1, ?2)
                     ON CONFLICT(path) DO UPDATE SET hash = excluded.hash",
                )?;
                for (_, key, hash) in &hashed {
                    if let Ok(hash) = hash {
                        stmt.execute(params![key, hash])?;
                    }
                }
            }
            tx.commit()?;
        }

        Ok(hashed
            .into_iter()
            .map(|(path, _, hash)| (path, hash))
            .collect())
    }

    /// Records for the direct children of `dir`
    pub fn records_under(&self, dir: &Path) -> Result<Vec<FingerprintRecord>> {
        let prefix = child_prefix(&canonical_key(dir));
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT path, hash FROM file_hashes
             WHERE substr(path, 1, length(?1)) = ?1
             ORDER BY path",
        )?;
        let rows = stmt.query_map([&prefix], |row| {
            Ok(FingerprintRecord {
                path: row.get(0)?,
                hash: row.get(1)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            let record = row?;
            let rest = &record.path[prefix.len()..];
            if !rest.is_empty() && !rest.contains('/') {
                records.push(record);
            }
        }
        Ok(records)
    }

    /// Delete records for direct children of `dir` that are absent from a
    /// live listing of it. Returns the number of rows removed.
    pub fn reconcile(&self, dir: &Path, live: &[FilesystemEntry]) -> Result<usize> {
        let live_keys: HashSet<String> = live.iter().map(|e| canonical_key(&e.path)).collect();
        let stale: Vec<String> = self
            .records_under(dir)?
            .into_iter()
            .map(|r| r.path)
            .filter(|p| !live_keys.contains(p))
            .collect();

        if stale.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare("DELETE FROM file_hashes WHERE path = ?1")?;
            for key in &stale {
                stmt.execute([key])?;
            }
        }
        tx.commit()?;

        log::info!("Pruned {} stale fingerprints under {}", stale.len(), dir.display());
        Ok(stale.len())
    }

    /// Remove the record for a path; true if one existed
    pub fn forget(&self, path: &Path) -> Result<bool> {
        let removed = self
            .conn()
            .execute("DELETE FROM file_hashes WHERE path = ?1", [canonical_key(path)])?;
        Ok(removed > 0)
    }

    /// Number of stored records
    pub fn len(&self) -> Result<usize> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM file_hashes", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

/// Create the table, dropping it first if the stored schema version differs
fn init_schema(db: &mut Connection) -> rusqlite::Result<()> {
    let version: i32 = db.pragma_query_value(None, "user_version", |row| row.get(0))?;

    let tx = db.transaction()?;
    if version != SCHEMA_VERSION {
        if version != 0 {
            log::info!(
                "Fingerprint schema {} does not match {}; rebuilding",
                version,
                SCHEMA_VERSION
            );
        }
        tx.execute("DROP TABLE IF EXISTS file_hashes", [])?;
        tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    }
    tx.execute(
        "CREATE TABLE IF NOT EXISTS file_hashes (
            path TEXT PRIMARY KEY,
            hash TEXT NOT NULL
        )",
        [],
    )?;
    tx.commit()
}

fn remove_database_files(db_path: &Path) {
    let _ = fs::remove_file(db_path);
    for suffix in ["-wal", "-shm"] {
        let mut side = db_path.as_os_str().to_owned();
        side.push(suffix);
        let _ = fs::remove_file(PathBuf::from(side));
    }
}

/// Key under which a path is stored
///
/// Resolves symlinks and normalises the path. If the file no longer exists its
/// parent is resolved instead, and failing that the absolute path is cleaned
/// lexically, so deleted files still address the row they were stored under.
/// A symlink whose target is gone keys to that target.
pub fn canonical_key(path: &Path) -> String {
    normalize_key(&resolve_path(path, MAX_LINK_DEPTH))
}

fn resolve_path(path: &Path, hops_left: usize) -> PathBuf {
    if let Ok(resolved) = fs::canonicalize(path) {
        return resolved;
    }

    if hops_left > 0 {
        if let Ok(target) = fs::read_link(path) {
            let target = match path.parent() {
                Some(parent) if target.is_relative() => parent.join(target),
                _ => target,
            };
            return resolve_path(&target, hops_left - 1);
        }
    }

    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => fs::canonicalize(parent)
            .map(|p| p.join(name))
            .unwrap_or_else(|_| lexical_absolute(path)),
        _ => lexical_absolute(path),
    }
}

fn lexical_absolute(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut cleaned = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                cleaned.pop();
            }
            other => cleaned.push(other.as_os_str()),
        }
    }
    cleaned
}

/// On Windows keys are case-insensitive, use `/`, and drop the `\\?\` prefix
fn normalize_key(path: &Path) -> String {
    #[cfg(windows)]
    {
        let s = path.to_string_lossy();
        let s = s.strip_prefix(r"\\?\").unwrap_or(&s);
        s.to_lowercase().replace('\\', "/")
    }
    #[cfg(not(windows))]
    {
        path.to_string_lossy().into_owned()
    }
}

fn child_prefix(dir_key: &str) -> String {
    if dir_key.ends_with('/') {
        dir_key.to_string()
    } else {
        format!("{}/", dir_key)
    }
}
