//! Filesystem entries produced by a directory listing

use serde::Serialize;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// One file or directory found while listing a directory
///
/// Built fresh on every listing and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilesystemEntry {
    pub path: PathBuf,
    pub name: String,
    pub is_directory: bool,
    /// Regular file whose content can be hashed; false for directories,
    /// pipes, sockets, devices and entries without readable metadata
    pub is_regular_file: bool,
    /// `None` for directories
    pub size_bytes: Option<u64>,
    /// Lower-cased suffix after the last `.`; empty for directories
    pub extension: String,
    /// Creation time, else modification time, else zero
    pub creation_time_millis: i64,
}

impl FilesystemEntry {
    /// Build an entry from a path and whatever metadata could be read for it
    pub fn from_metadata(path: PathBuf, metadata: Option<&Metadata>) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let is_directory = metadata.map(|m| m.is_dir()).unwrap_or(false);
        let is_regular_file = metadata.map(|m| m.is_file()).unwrap_or(false);

        let size_bytes = if is_directory {
            None
        } else {
            Some(metadata.map(|m| m.len()).unwrap_or(0))
        };

        let extension = if is_directory {
            String::new()
        } else {
            extension_of(&name)
        };

        let creation_time_millis = metadata
            .map(|m| creation_time_millis(&path, m))
            .unwrap_or(0);

        Self {
            path,
            name,
            is_directory,
            is_regular_file,
            size_bytes,
            extension,
            creation_time_millis,
        }
    }

    /// Size used for ordering: directories count as zero
    pub fn sort_size(&self) -> u64 {
        self.size_bytes.unwrap_or(0)
    }

    /// Only regular files are fingerprinted
    pub fn is_file(&self) -> bool {
        self.is_regular_file
    }
}

/// Lower-cased text after the last `.` of a file name, or empty if there is none
pub fn extension_of(name: &str) -> String {
    name.rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default()
}

/// Creation time in milliseconds since the epoch
///
/// Falls back to the modification time when the filesystem does not report a
/// birth time, and to zero when neither is available.
pub fn creation_time_millis(path: &Path, metadata: &Metadata) -> i64 {
    match metadata.created() {
        Ok(created) => return system_time_to_millis(created),
        Err(e) => log::debug!("No creation time for {}: {}", path.display(), e),
    }
    match metadata.modified() {
        Ok(modified) => system_time_to_millis(modified),
        Err(e) => {
            log::debug!("No modification time for {}: {}", path.display(), e);
            0
        }
    }
}

fn system_time_to_millis(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(duration) => i64::try_from(duration.as_millis()).unwrap_or(i64::MAX),
        Err(before) => i64::try_from(before.duration().as_millis())
            .map(|ms| -ms)
            .unwrap_or(i64::MIN),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("report.PDF"), "pdf");
        assert_eq!(extension_of("archive.tar.gz"), "gz");
        assert_eq!(extension_of("Makefile"), "");
        assert_eq!(extension_of(".bashrc"), "bashrc");
        assert_eq!(extension_of("trailing."), "");
    }

    #[test]
    fn test_file_entry() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("notes.TXT");
        fs::write(&path, "hello").unwrap();
        let metadata = fs::metadata(&path).unwrap();

        let entry = FilesystemEntry::from_metadata(path.clone(), Some(&metadata));
        assert_eq!(entry.name, "notes.TXT");
        assert_eq!(entry.extension, "txt");
        assert_eq!(entry.size_bytes, Some(5));
        assert!(entry.is_file());
        assert!(entry.creation_time_millis > 0);
    }

    #[test]
    fn test_directory_entry_has_no_size_or_extension() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("photos.d");
        fs::create_dir(&path).unwrap();
        let metadata = fs::metadata(&path).unwrap();

        let entry = FilesystemEntry::from_metadata(path, Some(&metadata));
        assert!(entry.is_directory);
        assert!(!entry.is_file());
        assert_eq!(entry.size_bytes, None);
        assert_eq!(entry.sort_size(), 0);
        assert_eq!(entry.extension, "");
    }

    #[test]
    fn test_missing_metadata_defaults() {
        let entry = FilesystemEntry::from_metadata(PathBuf::from("/nowhere/ghost.bin"), None);
        assert_eq!(entry.name, "ghost.bin");
        assert_eq!(entry.size_bytes, Some(0));
        assert!(!entry.is_file());
        assert_eq!(entry.creation_time_millis, 0);
        assert_eq!(entry.extension, "bin");
    }

    #[cfg(unix)]
    #[test]
    fn test_character_device_is_not_a_regular_file() {
        let path = PathBuf::from("/dev/null");
        let metadata = fs::metadata(&path).unwrap();
        let entry = FilesystemEntry::from_metadata(path, Some(&metadata));
        assert!(!entry.is_directory);
        assert!(!entry.is_file());
    }

    #[test]
    fn test_system_time_to_millis() {
        assert_eq!(system_time_to_millis(UNIX_EPOCH), 0);
        assert_eq!(
            system_time_to_millis(UNIX_EPOCH + Duration::from_millis(1500)),
            1500
        );
        assert_eq!(
            system_time_to_millis(UNIX_EPOCH - Duration::from_millis(20)),
            -20
        );
    }
}
