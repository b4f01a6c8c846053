//! Membership Error Types
//!
//! Two tiers of failure exist in the membership core:
//! - Invariant violations are fatal and must propagate to the caller
//! - Expected negative outcomes are not errors at all (they surface as
//!   `None`, an unchanged membership, or `false`)
//!
//! Only the first tier and content decoding failures live here.

use std::fmt;

/// Membership error type
#[derive(Debug, Clone)]
pub struct MembershipError {
    /// Error kind
    pub kind: MembershipErrorKind,
    /// Error message
    pub message: String,
}

/// Membership error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipErrorKind {
    /// A structural invariant of a membership or I/O round was broken
    InvariantViolation,

    /// Two memberships share a version but differ in content
    InvalidMembership,

    /// An instance that is not part of the membership was referenced
    UnknownMember,

    /// The volume type has no segment form for the role counts
    UnknownSegmentForm,

    /// A serialized membership could not be decoded
    MalformedContent,

    /// Configuration error
    Configuration,
}

impl MembershipError {
    /// Create a new membership error.
    pub fn new(kind: MembershipErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Create an invariant violation error.
    pub fn invariant_violation(message: impl Into<String>) -> Self {
        Self::new(MembershipErrorKind::InvariantViolation, message)
    }

    /// Create an invalid membership error.
    pub fn invalid_membership(message: impl Into<String>) -> Self {
        Self::new(MembershipErrorKind::InvalidMembership, message)
    }

    /// Create an unknown member error.
    pub fn unknown_member(message: impl Into<String>) -> Self {
        Self::new(MembershipErrorKind::UnknownMember, message)
    }

    /// Create an unknown segment form error.
    pub fn unknown_segment_form(message: impl Into<String>) -> Self {
        Self::new(MembershipErrorKind::UnknownSegmentForm, message)
    }

    /// Create a malformed content error.
    pub fn malformed_content(message: impl Into<String>) -> Self {
        Self::new(MembershipErrorKind::MalformedContent, message)
    }

    /// Create a configuration error.
    pub fn configuration_error(message: impl Into<String>) -> Self {
        Self::new(MembershipErrorKind::Configuration, message)
    }

    /// Check if this error is fatal (a protocol bug upstream, never retried).
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.kind,
            MembershipErrorKind::InvariantViolation
                | MembershipErrorKind::InvalidMembership
                | MembershipErrorKind::UnknownMember
                | MembershipErrorKind::UnknownSegmentForm
        )
    }
}

impl fmt::Display for MembershipError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MembershipError({:?}): {}", self.kind, self.message)
    }
}

impl std::error::Error for MembershipError {}

/// Result type for membership operations
pub type MembershipResult<T> = Result<T, MembershipError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_errors() {
        assert!(MembershipError::invariant_violation("test").is_fatal());
        assert!(MembershipError::invalid_membership("test").is_fatal());
        assert!(MembershipError::unknown_member("test").is_fatal());
        assert!(MembershipError::unknown_segment_form("test").is_fatal());
    }

    #[test]
    fn test_non_fatal_errors() {
        assert!(!MembershipError::malformed_content("test").is_fatal());
        assert!(!MembershipError::configuration_error("test").is_fatal());
    }

    #[test]
    fn test_error_display() {
        let err = MembershipError::invalid_membership("same version, different content");
        let display = format!("{}", err);
        assert!(display.contains("InvalidMembership"));
        assert!(display.contains("same version, different content"));
    }
}
