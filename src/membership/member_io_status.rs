//! Member I/O Status State Machine
//!
//! Each member of a segment carries a liveness status while I/O is in
//! flight. Statuses are grouped into role families:
//! - Primary: `Primary`, `PrimaryDown`, `UnstablePrimary`
//! - Secondary: `Secondary`, `SecondaryDown`, `SecondaryReadDown`, `TempPrimary`
//! - JoiningSecondary: `JoiningSecondary`, `JoiningSecondaryDown`
//! - Arbiter: `Arbiter`, `ArbiterDown`
//!
//! `InactiveSecondary` and `ExternalMember` belong to no family and are
//! always fully down.
//!
//! Within a family a status may only move towards more "down" axes
//! (read, write). Moving back up requires a new membership instance.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role family a status belongs to for compatibility checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoleFamily {
    Primary,
    Secondary,
    JoiningSecondary,
    Arbiter,
}

impl RoleFamily {
    /// The family's live, undegraded status.
    pub fn live_status(&self) -> MemberIoStatus {
        match self {
            RoleFamily::Primary => MemberIoStatus::Primary,
            RoleFamily::Secondary => MemberIoStatus::Secondary,
            RoleFamily::JoiningSecondary => MemberIoStatus::JoiningSecondary,
            RoleFamily::Arbiter => MemberIoStatus::Arbiter,
        }
    }

    /// The family's fully down status.
    pub fn down_status(&self) -> MemberIoStatus {
        match self {
            RoleFamily::Primary => MemberIoStatus::PrimaryDown,
            RoleFamily::Secondary => MemberIoStatus::SecondaryDown,
            RoleFamily::JoiningSecondary => MemberIoStatus::JoiningSecondaryDown,
            RoleFamily::Arbiter => MemberIoStatus::ArbiterDown,
        }
    }
}

/// Per-member liveness status, numbered as on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemberIoStatus {
    Primary = 1,
    Secondary = 2,
    JoiningSecondary = 3,
    Arbiter = 4,
    PrimaryDown = 5,
    SecondaryDown = 6,
    JoiningSecondaryDown = 7,
    ArbiterDown = 8,
    InactiveSecondary = 9,
    ExternalMember = 10,
    /// A secondary acting as primary while the formal primary is unusable
    TempPrimary = 11,
    UnstablePrimary = 12,
    /// Secondary that still takes writes but must not serve reads
    SecondaryReadDown = 13,
}

impl MemberIoStatus {
    /// All statuses in wire order.
    pub const ALL: [MemberIoStatus; 13] = [
        MemberIoStatus::Primary,
        MemberIoStatus::Secondary,
        MemberIoStatus::JoiningSecondary,
        MemberIoStatus::Arbiter,
        MemberIoStatus::PrimaryDown,
        MemberIoStatus::SecondaryDown,
        MemberIoStatus::JoiningSecondaryDown,
        MemberIoStatus::ArbiterDown,
        MemberIoStatus::InactiveSecondary,
        MemberIoStatus::ExternalMember,
        MemberIoStatus::TempPrimary,
        MemberIoStatus::UnstablePrimary,
        MemberIoStatus::SecondaryReadDown,
    ];

    /// Wire value.
    pub fn value(&self) -> u8 {
        *self as u8
    }

    /// Look a status up by wire value.
    pub fn from_value(value: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.value() == value)
    }

    /// Get state name for logging.
    pub fn state_name(&self) -> &'static str {
        match self {
            MemberIoStatus::Primary => "Primary",
            MemberIoStatus::Secondary => "Secondary",
            MemberIoStatus::JoiningSecondary => "JoiningSecondary",
            MemberIoStatus::Arbiter => "Arbiter",
            MemberIoStatus::PrimaryDown => "PrimaryDown",
            MemberIoStatus::SecondaryDown => "SecondaryDown",
            MemberIoStatus::JoiningSecondaryDown => "JoiningSecondaryDown",
            MemberIoStatus::ArbiterDown => "ArbiterDown",
            MemberIoStatus::InactiveSecondary => "InactiveSecondary",
            MemberIoStatus::ExternalMember => "ExternalMember",
            MemberIoStatus::TempPrimary => "TempPrimary",
            MemberIoStatus::UnstablePrimary => "UnstablePrimary",
            MemberIoStatus::SecondaryReadDown => "SecondaryReadDown",
        }
    }

    /// Whether `self` stands in for `other` when roles are compared.
    ///
    /// Degraded variants match their live base status; `TempPrimary` and
    /// `SecondaryReadDown` matches `Secondary`, `UnstablePrimary` matches
    /// `Primary`. A `*Down` variant does not match itself.
    pub fn matches(&self, other: MemberIoStatus) -> bool {
        use MemberIoStatus::*;
        match self {
            Primary | Secondary | JoiningSecondary | Arbiter | InactiveSecondary
            | ExternalMember => *self == other,
            PrimaryDown => other == Primary,
            SecondaryDown => other == Secondary,
            JoiningSecondaryDown => other == JoiningSecondary,
            ArbiterDown => other == Arbiter,
            TempPrimary => matches!(other, TempPrimary | Secondary),
            UnstablePrimary => matches!(other, UnstablePrimary | Primary),
            SecondaryReadDown => matches!(other, SecondaryReadDown | Secondary),
        }
    }

    pub fn is_primary(&self) -> bool {
        self.matches(MemberIoStatus::Primary)
    }

    pub fn is_secondary(&self) -> bool {
        self.matches(MemberIoStatus::Secondary)
    }

    pub fn is_joining_secondary(&self) -> bool {
        self.matches(MemberIoStatus::JoiningSecondary)
    }

    pub fn is_arbiter(&self) -> bool {
        self.matches(MemberIoStatus::Arbiter)
    }

    pub fn is_temp_primary(&self) -> bool {
        self.matches(MemberIoStatus::TempPrimary)
    }

    pub fn is_unstable_primary(&self) -> bool {
        self.matches(MemberIoStatus::UnstablePrimary)
    }

    /// Role family, or `None` for inactive and external members.
    pub fn role_family(&self) -> Option<RoleFamily> {
        if self.is_primary() {
            Some(RoleFamily::Primary)
        } else if self.is_secondary() {
            Some(RoleFamily::Secondary)
        } else if self.is_joining_secondary() {
            Some(RoleFamily::JoiningSecondary)
        } else if self.is_arbiter() {
            Some(RoleFamily::Arbiter)
        } else {
            None
        }
    }

    /// Member is unusable for both reads and writes.
    pub fn is_down(&self) -> bool {
        use MemberIoStatus::*;
        matches!(
            self,
            PrimaryDown
                | SecondaryDown
                | JoiningSecondaryDown
                | ArbiterDown
                | InactiveSecondary
                | ExternalMember
        )
    }

    pub fn is_read_down(&self) -> bool {
        self.is_down() || *self == MemberIoStatus::SecondaryReadDown
    }

    pub fn is_write_down(&self) -> bool {
        self.is_down()
    }

    fn down_count(&self) -> u8 {
        self.is_read_down() as u8 + self.is_write_down() as u8
    }

    /// Both statuses belong to the same role family.
    ///
    /// Statuses without a family share a role with nothing.
    pub fn same_role(&self, next: MemberIoStatus) -> bool {
        match (self.role_family(), next.role_family()) {
            (Some(mine), Some(theirs)) => mine == theirs,
            _ => false,
        }
    }

    /// Check whether a status update from `self` to `next` is legal.
    ///
    /// Only moves within a role family towards an equal or larger number
    /// of down axes are allowed; at equal count the read and write axes
    /// must agree (both up or both down).
    pub fn can_move_to(&self, next: MemberIoStatus) -> bool {
        if !self.same_role(next) {
            return false;
        }

        let mine = self.down_count();
        let theirs = next.down_count();

        if theirs > mine {
            true
        } else if theirs == mine {
            theirs == 0 || theirs == 2
        } else {
            false
        }
    }

    /// Join two independently observed statuses of the same member.
    ///
    /// The result is the status with more down axes. Two live statuses of a
    /// family resolve to the degraded one (`UnstablePrimary`, `TempPrimary`)
    /// over the plain live status, and two statuses
    /// down on different single axes resolve to the fully down status.
    /// Statuses from different families leave `self` untouched.
    pub fn merge(&self, next: MemberIoStatus) -> MemberIoStatus {
        let family = match (self.role_family(), next.role_family()) {
            (Some(mine), Some(theirs)) if mine == theirs => mine,
            _ => return *self,
        };

        if *self == next {
            return *self;
        }

        let mine = self.down_count();
        let theirs = next.down_count();

        if mine == 2 {
            *self
        } else if theirs > mine {
            next
        } else if theirs < mine {
            *self
        } else if mine == 0 {
            if *self == family.live_status() {
                next
            } else {
                *self
            }
        } else if (self.is_read_down() && next.is_read_down())
            || (self.is_write_down() && next.is_write_down())
        {
            *self
        } else {
            family.down_status()
        }
    }
}

impl fmt::Display for MemberIoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.state_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use MemberIoStatus::*;

    #[test]
    fn test_wire_values() {
        assert_eq!(Primary.value(), 1);
        assert_eq!(SecondaryReadDown.value(), 13);
        assert_eq!(MemberIoStatus::from_value(11), Some(TempPrimary));
        assert_eq!(MemberIoStatus::from_value(0), None);
        assert_eq!(MemberIoStatus::from_value(14), None);
    }

    #[test]
    fn test_role_predicates() {
        assert!(PrimaryDown.is_primary());
        assert!(UnstablePrimary.is_primary());
        assert!(TempPrimary.is_secondary());
        assert!(SecondaryReadDown.is_secondary());
        assert!(!TempPrimary.is_primary());
        assert!(TempPrimary.is_temp_primary());
        assert!(!Secondary.is_temp_primary());
        assert!(ArbiterDown.is_arbiter());
        assert!(JoiningSecondaryDown.is_joining_secondary());
        assert_eq!(InactiveSecondary.role_family(), None);
        assert_eq!(ExternalMember.role_family(), None);
    }

    #[test]
    fn test_down_axes() {
        assert!(SecondaryReadDown.is_read_down());
        assert!(!SecondaryReadDown.is_write_down());
        assert!(!SecondaryReadDown.is_down());
        assert!(InactiveSecondary.is_down());
        assert!(ExternalMember.is_write_down());
        assert!(!TempPrimary.is_down());
        assert!(!UnstablePrimary.is_read_down());
    }

    #[test]
    fn test_roleless_statuses_share_nothing() {
        assert!(!InactiveSecondary.same_role(PrimaryDown));
        assert!(!ExternalMember.same_role(ExternalMember));
        assert!(!InactiveSecondary.can_move_to(InactiveSecondary));
        assert_eq!(InactiveSecondary.merge(SecondaryDown), InactiveSecondary);
    }

    #[test]
    fn test_single_axis_swap_forbidden() {
        // SecondaryReadDown is the only single-axis status; it may stay or go fully down
        assert!(!SecondaryReadDown.can_move_to(SecondaryReadDown));
        assert!(SecondaryReadDown.can_move_to(SecondaryDown));
        assert!(!SecondaryDown.can_move_to(SecondaryReadDown));
    }

    #[test]
    fn test_merge_live_tie_keeps_degraded_status() {
        assert_eq!(UnstablePrimary.merge(Primary), UnstablePrimary);
        assert_eq!(Primary.merge(UnstablePrimary), UnstablePrimary);
        assert_eq!(TempPrimary.merge(Secondary), TempPrimary);
        assert_eq!(Secondary.merge(TempPrimary), TempPrimary);
        assert_eq!(TempPrimary.merge(TempPrimary), TempPrimary);
        assert_eq!(Primary.merge(Primary), Primary);
    }
}
