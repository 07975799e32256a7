//! filemark library crate
//!
//! Directory listing with deterministic ordering, plus a persistent store of
//! content fingerprints used to flag files that changed since they were last
//! recorded. The CLI binary is a thin layer over this API.

pub mod cli;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod listing;
pub mod logging;
pub mod output;
pub mod progress;
pub mod session;

pub use error::{Error, Result};
pub use fingerprint::{ChangeStatus, FingerprintRecord, FingerprintStore};
pub use listing::{list, FilesystemEntry, SortKey, SortOrder};
pub use session::{BrowseSession, SessionStats};
