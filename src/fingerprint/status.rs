//! Outcome of comparing a file against its stored fingerprint

use serde::Serialize;
use std::fmt;

/// Status of a file compared to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeStatus {
    /// Stored and current hashes differ
    Changed,
    /// Stored and current hashes match
    Unchanged,
    /// No fingerprint has been recorded for this path
    Untracked,
    /// A record exists but the current content could not be hashed
    Unknown,
}

impl ChangeStatus {
    /// Two-valued view: only a confirmed difference counts as changed
    pub fn is_changed(self) -> bool {
        self == ChangeStatus::Changed
    }

    pub fn label(self) -> &'static str {
        match self {
            ChangeStatus::Changed => "changed",
            ChangeStatus::Unchanged => "unchanged",
            ChangeStatus::Untracked => "untracked",
            ChangeStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_changed_is_changed() {
        assert!(ChangeStatus::Changed.is_changed());
        assert!(!ChangeStatus::Unchanged.is_changed());
        assert!(!ChangeStatus::Untracked.is_changed());
        assert!(!ChangeStatus::Unknown.is_changed());
    }

    #[test]
    fn test_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ChangeStatus::Untracked).unwrap(), "\"untracked\"");
    }
}
