//! Privacy-preserving sender grouping.

use sha2::{Digest, Sha256};

/// Length of the stored digest in hex characters (64 bits).
pub const HASH_LEN: usize = 16;

/// One-way digest of a normalized identifier (E.164 phone or lowercased
/// trimmed name): the first 16 hex characters of SHA-256.
///
/// 64 bits is plenty for grouping "N messages from the same sender" and is
/// deliberately too short to pretend to be an identity check. Raw phone
/// numbers and names never leave this function's caller.
pub fn hash_identity(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    hex::encode(digest)[..HASH_LEN].to_string()
}

/// Digest for the name-only submission path: case-insensitive grouping.
pub fn hash_name(name: &str) -> String {
    hash_identity(&name.trim().to_lowercase())
}
