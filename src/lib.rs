//! segquorum - replica-set membership and I/O quorum decisions for
//! segment-replicated block storage
//!
//! - `membership`: versioned memberships, member status, segment forms
//! - `store`: snapshot sinks and the per-segment registry
//! - `observability`: structured logging and counters
//! - `config`: engine configuration
//! - `cli`: inspection commands

pub mod cli;
pub mod config;
pub mod membership;
pub mod observability;
pub mod store;
