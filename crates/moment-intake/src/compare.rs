//! Timing-safe equality for secrets.

use sha2::{Digest, Sha256};

/// Compare two secrets without leaking their contents through timing.
///
/// Both sides are hashed to a fixed 32-byte digest first, so a length
/// mismatch takes the same comparison path as a content mismatch, then the
/// digests are folded byte-by-byte with no early exit.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let da = Sha256::digest(a);
    let db = Sha256::digest(b);
    da.iter()
        .zip(db.iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
