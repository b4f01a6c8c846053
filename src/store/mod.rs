//! Membership persistence
//!
//! - `MembershipSink`: receives a snapshot on every installed membership
//! - `MemoryMembershipSink` / `FileMembershipSink`: in-memory and
//!   append-only CRC32-checked implementations
//! - `MembershipRegistry`: per-segment installs guarded by one lock

mod checksum;
mod errors;
mod registry;
mod sink;

pub use checksum::{compute_checksum, verify_checksum};
pub use errors::{StoreError, StoreResult};
pub use registry::MembershipRegistry;
pub use sink::{
    read_records, FileMembershipSink, MembershipSink, MemoryMembershipSink, SnapshotRecord,
};

use crate::config::EngineConfig;

/// Build the sink described by `config`.
pub fn open_sink(config: &EngineConfig) -> StoreResult<Box<dyn MembershipSink>> {
    match config.store_path() {
        Some(path) => Ok(Box::new(FileMembershipSink::open(
            path,
            config.fsync_on_persist,
        )?)),
        None => Ok(Box::new(MemoryMembershipSink::new())),
    }
}
