//! Segment membership and I/O quorum decisions
//!
//! Leaf-first:
//! - `InstanceId`, `EndPoint` and `SegmentVersion` identify members and
//!   order memberships
//! - `MemberIoStatus` is the per-member liveness state machine
//! - `IoMember`, `SecondariesCountInfo` and `IoActionContext` describe one
//!   I/O round
//! - `VolumeType` fixes the member layout and quorum sizes
//! - `SegmentForm` answers the quorum questions for each role layout
//! - `SegmentMembership` is the replica set and its transitions
//! - `SegmentMembershipHelper` guards installing a higher membership

mod errors;
mod form_rules;
mod helper;
mod instance;
mod io_context;
mod io_member;
mod member_io_status;
mod quorum;
mod segment_form;
mod segment_membership;
mod version;
mod volume_type;

pub use errors::{MembershipError, MembershipErrorKind, MembershipResult};
pub use helper::SegmentMembershipHelper;
pub use instance::{EndPoint, InstanceId};
pub use io_context::IoActionContext;
pub use io_member::{IoMember, ReadCause, SecondariesCountInfo};
pub use member_io_status::{MemberIoStatus, RoleFamily};
pub use quorum::{check_bad_write_quorum, check_write_quorum, RoleCounts};
pub use segment_form::SegmentForm;
pub use segment_membership::{SegmentMembership, SegmentMembershipBuilder};
pub use version::SegmentVersion;
pub use volume_type::{VolumeShape, VolumeType};
