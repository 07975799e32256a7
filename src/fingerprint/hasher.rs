//! Content hashing
//!
//! SHA-256 over the full byte stream, read in fixed-size chunks. The digest
//! depends only on the bytes, never on how they were chunked.

use crate::config::DEFAULT_CHUNK_SIZE;
use crate::error::{Error, Result};
use sha2::{Digest, Sha256};
use std::fs::{self, File, Metadata};
use std::io::{self, Read};
use std::path::Path;

/// Length of a hex-encoded SHA-256 digest
pub const HASH_HEX_LEN: usize = 64;

/// Hash the content of a file with the default chunk size
pub fn compute_hash(path: &Path) -> Result<String> {
    compute_hash_chunked(path, DEFAULT_CHUNK_SIZE)
}

/// Hash the content of a file, reading `chunk_size` bytes at a time
///
/// Fails with [`Error::IoFailure`] if the path is not a regular file, cannot
/// be opened, or a read fails part way through; no partial digest is ever
/// returned.
pub fn compute_hash_chunked(path: &Path, chunk_size: usize) -> Result<String> {
    // Opening a FIFO blocks until a writer shows up, so check before opening
    let metadata = fs::metadata(path).map_err(|e| Error::io(path, e))?;
    ensure_regular_file(path, &metadata)?;

    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    // The path may have been swapped between the check and the open
    let opened = file.metadata().map_err(|e| Error::io(path, e))?;
    ensure_regular_file(path, &opened)?;

    hash_reader(file, chunk_size).map_err(|e| Error::io(path, e))
}

fn ensure_regular_file(path: &Path, metadata: &Metadata) -> Result<()> {
    if metadata.is_file() {
        Ok(())
    } else {
        Err(Error::io(
            path,
            io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
        ))
    }
}

/// Hash everything a reader yields, returning lower-case hex
pub fn hash_reader<R: Read>(mut reader: R, chunk_size: usize) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; chunk_size.max(1)];

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Whether a string is a complete lower-case hex digest
pub fn is_valid_hash(hash: &str) -> bool {
    hash.len() == HASH_HEX_LEN && hash.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
    const HELLO_WORLD_SHA256: &str =
        "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    /// Yields `good` bytes, then fails
    struct FailingReader {
        good: usize,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.good == 0 {
                return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "file vanished"));
            }
            let n = self.good.min(buf.len());
            buf[..n].fill(b'x');
            self.good -= n;
            Ok(n)
        }
    }

    #[test]
    fn test_known_digests() {
        let temp_dir = TempDir::new().unwrap();
        let empty = temp_dir.path().join("empty");
        let hello = temp_dir.path().join("hello");
        fs::write(&empty, b"").unwrap();
        fs::write(&hello, b"hello world").unwrap();

        assert_eq!(compute_hash(&empty).unwrap(), EMPTY_SHA256);
        assert_eq!(compute_hash(&hello).unwrap(), HELLO_WORLD_SHA256);
    }

    #[test]
    fn test_chunk_size_does_not_change_digest() {
        let data: Vec<u8> = (0..50_000u32).map(|i| (i % 251) as u8).collect();
        let expected = hash_reader(&data[..], DEFAULT_CHUNK_SIZE).unwrap();

        for chunk in [1, 3, 64, 4096, 65_536] {
            assert_eq!(hash_reader(&data[..], chunk).unwrap(), expected, "chunk {}", chunk);
        }
    }

    #[test]
    fn test_deterministic_and_distinct() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("a");
        let b = temp_dir.path().join("b");
        fs::write(&a, b"same bytes").unwrap();
        fs::write(&b, b"same bytes!").unwrap();

        let first = compute_hash(&a).unwrap();
        assert_eq!(first, compute_hash(&a).unwrap());
        assert_ne!(first, compute_hash(&b).unwrap());
        assert!(is_valid_hash(&first));
    }

    #[test]
    fn test_missing_file_is_io_failure() {
        let temp_dir = TempDir::new().unwrap();
        let err = compute_hash(&temp_dir.path().join("missing")).unwrap_err();
        assert!(err.is_io_failure());
    }

    #[test]
    fn test_read_error_mid_stream_returns_error() {
        let result = hash_reader(FailingReader { good: 20_000 }, 8192);
        assert!(result.is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_directory_read_is_io_failure() {
        let temp_dir = TempDir::new().unwrap();
        let err = compute_hash(temp_dir.path()).unwrap_err();
        assert!(err.is_io_failure());
    }

    #[cfg(unix)]
    #[test]
    fn test_device_is_io_failure() {
        let err = compute_hash(Path::new("/dev/zero")).unwrap_err();
        assert!(err.is_io_failure());
    }

    #[cfg(unix)]
    #[test]
    fn test_fifo_is_rejected_without_blocking() {
        let temp_dir = TempDir::new().unwrap();
        let fifo = temp_dir.path().join("pipe");
        let made = std::process::Command::new("mkfifo").arg(&fifo).status().unwrap();
        assert!(made.success());

        // Would block forever waiting for a writer if the pipe were opened
        let err = compute_hash(&fifo).unwrap_err();
        assert!(err.is_io_failure());
    }

    #[test]
    fn test_is_valid_hash() {
        assert!(is_valid_hash(EMPTY_SHA256));
        assert!(!is_valid_hash(&EMPTY_SHA256[..63]));
        assert!(!is_valid_hash(&EMPTY_SHA256.to_uppercase()));
    }
}
