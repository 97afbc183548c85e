//! Content checksums for drift detection

use sha2::{Digest, Sha256};

/// Compute the SHA-256 checksum of a text payload
///
/// Returns the hex-encoded digest of the UTF-8 bytes. Used by the sync
/// layer to detect byte-level drift without re-parsing the document.
pub fn checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_digest() {
        // Known SHA-256 of "hello world"
        assert_eq!(
            checksum("hello world"),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn stable_across_calls() {
        assert_eq!(checksum("abc"), checksum("abc"));
        assert_ne!(checksum("abc"), checksum("abd"));
    }

    #[test]
    fn empty_content() {
        assert_eq!(
            checksum(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
