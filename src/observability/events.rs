//! Observable membership events
//!
//! Events are explicit and typed. Every log line the engine writes is
//! keyed by one of these.

use std::fmt;

/// Observable events of the membership engine
///
/// These cover:
/// - Membership transitions and installation
/// - Member I/O status tracking
/// - Quorum decisions
/// - Persistence and configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Transitions
    /// A transition produced a new membership
    TransitionApplied,
    /// A transition's precondition did not hold
    TransitionRejected,

    // Member I/O status
    /// An illegal status move was ignored
    StatusMoveRejected,
    /// A status was changed while merging an equal membership
    StatusMerged,
    /// Status of an inactive secondary was looked up
    InactiveMemberStatus,

    // Quorum decisions
    /// A round was marked for immediate resend
    ResendDecided,
    /// A create or commit could not go anywhere
    WriteRefused,

    // Installation
    /// A membership replaced the installed one
    MembershipInstalled,
    /// A membership was not installed
    InstallRefused,
    /// The admission check refused a higher membership
    HigherMembershipRefused,

    // Persistence and configuration
    /// Configuration loaded
    ConfigLoaded,
    /// Snapshot appended to the membership log
    SnapshotPersisted,
    /// Snapshot failed checksum verification (FATAL)
    SnapshotCorrupted,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::TransitionApplied => "MEMBERSHIP_TRANSITION_APPLIED",
            Event::TransitionRejected => "MEMBERSHIP_TRANSITION_REJECTED",

            Event::StatusMoveRejected => "MEMBER_STATUS_MOVE_REJECTED",
            Event::StatusMerged => "MEMBER_STATUS_MERGED",
            Event::InactiveMemberStatus => "INACTIVE_MEMBER_STATUS",

            Event::ResendDecided => "IO_RESEND_DECIDED",
            Event::WriteRefused => "IO_WRITE_REFUSED",

            Event::MembershipInstalled => "MEMBERSHIP_INSTALLED",
            Event::InstallRefused => "MEMBERSHIP_INSTALL_REFUSED",
            Event::HigherMembershipRefused => "HIGHER_MEMBERSHIP_REFUSED",

            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::SnapshotPersisted => "MEMBERSHIP_SNAPSHOT_PERSISTED",
            Event::SnapshotCorrupted => "MEMBERSHIP_SNAPSHOT_CORRUPTED",
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::SnapshotCorrupted)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
