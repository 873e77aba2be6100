//! Archive integrity
//!
//! The registry advertises a SHA-256 digest for every source archive; the
//! same digest may also be pinned by the caller (from a resolved state
//! file). Both are checked against the bytes actually received.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 digest of a byte string, lower-case hex encoded
pub fn checksum(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}
