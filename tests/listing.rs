use filemark::{list, SortKey, SortOrder};
use std::fs;
use tempfile::TempDir;

fn names(entries: &[filemark::FilesystemEntry]) -> Vec<String> {
    entries.iter().map(|e| e.name.clone()).collect()
}

#[test]
fn name_sort_puts_capitals_first() {
    let temp_dir = TempDir::new().unwrap();
    for name in ["b.txt", "A.txt", "c"] {
        fs::write(temp_dir.path().join(name), name).unwrap();
    }

    let entries = list(temp_dir.path(), SortKey::Name, SortOrder::Ascending).unwrap();
    assert_eq!(names(&entries), vec!["A.txt", "b.txt", "c"]);
}

#[test]
fn size_sort_descending_is_reverse_of_ascending() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("ten"), [1u8; 10]).unwrap();
    fs::write(temp_dir.path().join("empty"), b"").unwrap();
    fs::write(temp_dir.path().join("five"), [1u8; 5]).unwrap();
    fs::create_dir(temp_dir.path().join("folder")).unwrap();

    let ascending = list(temp_dir.path(), SortKey::Size, SortOrder::Ascending).unwrap();
    let low: Vec<u64> = ascending.iter().map(|e| e.sort_size()).collect();
    assert_eq!(low, vec![0, 0, 5, 10]);
    assert!(ascending[..2].iter().any(|e| e.is_directory));

    let mut expected = names(&ascending);
    expected.reverse();
    let descending = list(temp_dir.path(), SortKey::Size, SortOrder::Descending).unwrap();
    assert_eq!(names(&descending), expected);
}

#[test]
fn extension_sort_places_directories_with_extensionless_files() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("song.MP3"), "x").unwrap();
    fs::write(temp_dir.path().join("doc.pdf"), "x").unwrap();
    fs::create_dir(temp_dir.path().join("music.d")).unwrap();

    let entries = list(temp_dir.path(), SortKey::Extension, SortOrder::Ascending).unwrap();
    assert_eq!(names(&entries), vec!["music.d", "song.MP3", "doc.pdf"]);
    assert_eq!(entries[1].extension, "mp3");
}

#[test]
fn empty_directory_lists_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let entries = list(temp_dir.path(), SortKey::Created, SortOrder::Descending).unwrap();
    assert!(entries.is_empty());
}

#[test]
fn missing_directory_is_not_readable() {
    let temp_dir = TempDir::new().unwrap();
    let err = list(&temp_dir.path().join("absent"), SortKey::Name, SortOrder::Ascending).unwrap_err();
    assert!(err.is_not_readable());
}
