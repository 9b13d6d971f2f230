//! Content hashing for change detection.
//!
//! A module is serialized to JSON and fingerprinted. Matching fingerprints
//! let the bulk pass skip validation and rendering for unchanged files.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::Result;

/// Fingerprints serialized module content.
///
/// Implementations must return the same digest for identical input.
pub trait Digester: Send + Sync {
    /// Digest of `serialized`.
    fn digest(&self, serialized: &[u8]) -> String;
}

/// SHA256 digester producing lowercase hex.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Digester;

impl Digester for Sha256Digester {
    fn digest(&self, serialized: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(serialized);
        format!("{:x}", hasher.finalize())
    }
}

/// Serialize `value` to JSON and digest it with `digester`.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
pub fn content_digest<T: Serialize>(digester: &dyn Digester, value: &T) -> Result<String> {
    let json = serde_json::to_vec(value)?;
    Ok(digester.digest(&json))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Module;

    #[test]
    fn test_content_digest_deterministic() {
        let module = Module::new("# Hello");

        let d1 = content_digest(&Sha256Digester, &module).unwrap();
        let d2 = content_digest(&Sha256Digester, &module).unwrap();

        assert_eq!(d1, d2);
        assert_eq!(d1.len(), 64); // SHA256 produces 64 hex chars
    }

    #[test]
    fn test_content_digest_changes_with_content() {
        let d1 = content_digest(&Sha256Digester, &Module::new("# Hello")).unwrap();
        let d2 = content_digest(&Sha256Digester, &Module::new("# Hello!")).unwrap();

        assert_ne!(d1, d2);
    }

    #[test]
    fn test_digester_hex_of_bytes() {
        assert_eq!(
            Sha256Digester.digest(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
