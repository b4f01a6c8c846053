//! Segment version
//!
//! A two-level version: the epoch changes only when the primary changes,
//! the generation changes on every other membership edit. Epoch strictly
//! dominates generation in the ordering.

use serde::{Deserialize, Serialize};
use std::fmt;

/// `(epoch, generation)` pair ordered lexicographically.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct SegmentVersion {
    epoch: u64,
    generation: u64,
}

impl SegmentVersion {
    pub fn new(epoch: u64, generation: u64) -> Self {
        Self { epoch, generation }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Next epoch, generation restarts at zero.
    pub fn inc_epoch(&self) -> Self {
        Self::new(self.epoch + 1, 0)
    }

    /// Same epoch, next generation.
    pub fn inc_generation(&self) -> Self {
        self.add_generation(1)
    }

    /// Same epoch, generation advanced by `n`.
    pub fn add_generation(&self, n: u64) -> Self {
        Self::new(self.epoch, self.generation + n)
    }
}

impl fmt::Display for SegmentVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SegmentVersion(epoch={}, generation={})",
            self.epoch, self.generation
        )
    }
}
