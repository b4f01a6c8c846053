//! Persistence errors

use std::io;

use thiserror::Error;

use crate::membership::{MembershipError, SegmentVersion};

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised while persisting or reloading memberships
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("checksum mismatch at line {line}: stored {stored:08x}, computed {computed:08x}")]
    ChecksumMismatch {
        line: usize,
        stored: u32,
        computed: u32,
    },

    #[error("malformed record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    #[error("segment {segment}: {offered} is older than persisted {persisted}")]
    StaleVersion {
        segment: u64,
        offered: SegmentVersion,
        persisted: SegmentVersion,
    },

    #[error("no membership installed for segment {0}")]
    UnknownSegment(u64),

    #[error("membership content: {0}")]
    Content(#[from] MembershipError),
}

impl StoreError {
    /// Corruption and fatal membership errors must stop the caller.
    pub fn is_fatal(&self) -> bool {
        match self {
            StoreError::ChecksumMismatch { .. } => true,
            StoreError::Content(e) => e.is_fatal(),
            _ => false,
        }
    }
}
