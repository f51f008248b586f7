//! Checksums for exported timetable documents.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Calculate the SHA-256 checksum of `content` as lowercase hex.
pub fn calculate_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Checksum of the compact JSON serialization of `value`.
///
/// Struct fields serialize in declaration order, so the same value always
/// hashes to the same digest.
pub fn json_checksum<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    let content = serde_json::to_string(value)?;
    Ok(calculate_checksum(&content))
}
