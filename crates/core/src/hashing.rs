//! Content digests for stored versions.
//!
//! Every version records the SHA-256 of its bytes at upload; reads compare
//! against it so a blob altered or truncated in storage is never served or
//! validated as the version it claims to be.

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `content`.
pub fn content_digest(content: &[u8]) -> String {
    format!("{:x}", Sha256::digest(content))
}

/// Whether `content` still matches a digest recorded by [`content_digest`].
/// Hex case is ignored.
pub fn matches_digest(content: &[u8], expected: &str) -> bool {
    content_digest(content).eq_ignore_ascii_case(expected)
}
