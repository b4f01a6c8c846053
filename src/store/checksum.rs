//! CRC32 over persisted membership content

use crc32fast::Hasher;

/// CRC32 (IEEE) of a snapshot's segment id and content.
///
/// The segment id is hashed first so a record moved to another segment
/// no longer verifies.
pub fn compute_checksum(segment: u64, content: &str) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(&segment.to_le_bytes());
    hasher.update(content.as_bytes());
    hasher.finalize()
}

pub fn verify_checksum(segment: u64, content: &str, expected: u32) -> bool {
    compute_checksum(segment, content) == expected
}
