use filemark::fingerprint::hasher::{compute_hash, HASH_HEX_LEN};
use filemark::{ChangeStatus, FingerprintStore};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn open_store(dir: &Path) -> FingerprintStore {
    FingerprintStore::open(&dir.join("state").join("file_hash.db")).unwrap()
}

#[test]
fn upsert_then_unchanged_content_is_not_changed() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(temp_dir.path());
    let file = temp_dir.path().join("report.txt");
    fs::write(&file, "quarterly numbers").unwrap();

    store.upsert(&file).unwrap();
    assert!(!store.has_changed(&file));
}

#[test]
fn modified_content_is_changed() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(temp_dir.path());
    let file = temp_dir.path().join("report.txt");
    fs::write(&file, "quarterly numbers").unwrap();
    store.upsert(&file).unwrap();

    fs::write(&file, "revised quarterly numbers").unwrap();
    assert!(store.has_changed(&file));
    assert_eq!(store.status(&file), ChangeStatus::Changed);
}

#[test]
fn never_seen_file_is_not_changed() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(temp_dir.path());
    let file = temp_dir.path().join("fresh.txt");
    fs::write(&file, "new").unwrap();

    assert!(!store.has_changed(&file));
    assert_eq!(store.status(&file), ChangeStatus::Untracked);
}

#[test]
fn lookup_returns_hash_that_compute_hash_produces() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(temp_dir.path());
    let file = temp_dir.path().join("data.bin");
    fs::write(&file, (0..=255u8).cycle().take(100_000).collect::<Vec<_>>()).unwrap();

    store.upsert(&file).unwrap();
    let stored = store.lookup(&file).unwrap();
    assert_eq!(stored, compute_hash(&file).unwrap());
    assert_eq!(stored.len(), HASH_HEX_LEN);
}

#[test]
fn repeated_upserts_keep_a_single_record() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(temp_dir.path());
    let file = temp_dir.path().join("a.txt");
    for content in ["one", "two", "three"] {
        fs::write(&file, content).unwrap();
        store.upsert(&file).unwrap();
    }
    assert_eq!(store.len().unwrap(), 1);
}

#[test]
fn failed_hash_leaves_prior_record_untouched() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(temp_dir.path());
    let file = temp_dir.path().join("a.txt");
    fs::write(&file, "before").unwrap();
    let before = store.upsert(&file).unwrap();

    fs::remove_file(&file).unwrap();
    assert!(compute_hash(&file).unwrap_err().is_io_failure());
    assert!(store.upsert(&file).unwrap_err().is_io_failure());
    assert_eq!(store.lookup(&file), Some(before));
    assert!(!store.has_changed(&file));
    assert_eq!(store.status(&file), ChangeStatus::Unknown);
}

#[test]
fn stale_records_are_kept_until_pruned() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(temp_dir.path());
    let dir = temp_dir.path().join("docs");
    fs::create_dir(&dir).unwrap();
    let file = dir.join("old.txt");
    fs::write(&file, "x").unwrap();
    store.upsert(&file).unwrap();
    fs::remove_file(&file).unwrap();

    assert_eq!(store.len().unwrap(), 1);

    let live = filemark::list(&dir, filemark::SortKey::Name, filemark::SortOrder::Ascending).unwrap();
    assert!(live.is_empty());
    assert_eq!(store.reconcile(&dir, &live).unwrap(), 1);
    assert!(store.is_empty().unwrap());
}
