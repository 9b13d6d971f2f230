//! Store record model.

use serde::{Deserialize, Serialize};

use super::module::Metadata;

/// One processed entry as persisted by a content store.
///
/// Records are keyed by `id`. At most one record exists per id within a
/// collection; a later write with the same id replaces the earlier one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreRecord {
    /// Logical id generated for the source file.
    pub id: String,

    /// Validated entry data.
    pub data: Metadata,

    /// Rendered output of the module body.
    pub rendered: String,

    /// Source path relative to the project root, `/`-separated.
    ///
    /// `None` for records written by something other than the sync engine.
    pub file_path: Option<String>,

    /// Content digest of the module the record was built from.
    pub digest: String,
}

impl StoreRecord {
    /// Whether this record was built from content with `digest` and
    /// remembers where it came from, so reprocessing can be skipped.
    #[must_use]
    pub fn is_current(&self, digest: &str) -> bool {
        self.file_path.is_some() && self.digest == digest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(file_path: Option<&str>, digest: &str) -> StoreRecord {
        StoreRecord {
            id: "posts/a".into(),
            data: Metadata::new(),
            rendered: String::new(),
            file_path: file_path.map(String::from),
            digest: digest.into(),
        }
    }

    #[test]
    fn test_is_current_requires_digest_and_path() {
        assert!(record(Some("src/content/posts/a.md"), "abc").is_current("abc"));
        assert!(!record(Some("src/content/posts/a.md"), "abc").is_current("xyz"));
        assert!(!record(None, "abc").is_current("abc"));
    }
}
