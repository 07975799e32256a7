//! Content fingerprints and change detection
//!
//! Stores the last known content hash of each file, keyed by canonical path,
//! and answers whether a file's content differs from what was recorded.

pub mod database;
pub mod hasher;
pub mod status;

pub use database::{canonical_key, FingerprintRecord, FingerprintStore};
pub use hasher::{compute_hash, HASH_HEX_LEN};
pub use status::ChangeStatus;
