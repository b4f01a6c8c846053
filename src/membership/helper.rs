//! Admission check for higher memberships

use super::errors::{MembershipError, MembershipResult};
use super::instance::InstanceId;
use super::segment_membership::SegmentMembership;
use crate::observability::{Event, Logger};

/// Checks applied before a higher membership replaces the current one.
pub struct SegmentMembershipHelper;

impl SegmentMembershipHelper {
    /// Decide whether `myself` may move from `current` to `higher`.
    ///
    /// A membership that contains me is always acceptable. One that leaves
    /// me out is only acceptable while it is missing members; a full
    /// membership without me means I was replaced.
    ///
    /// `total_members` is the member count of a complete membership.
    pub fn ok_to_update_to_higher_membership(
        higher: &SegmentMembership,
        current: &SegmentMembership,
        myself: InstanceId,
        total_members: usize,
    ) -> MembershipResult<bool> {
        if total_members == 0 {
            return Err(MembershipError::invariant_violation(
                "a complete membership has at least one member",
            ));
        }

        if !higher.contain(myself) && higher.alive_size() == total_members {
            Logger::error(
                Event::HigherMembershipRefused.as_str(),
                &[
                    ("instance", &myself.to_string()),
                    ("current", &current.to_string()),
                    ("higher", &higher.to_string()),
                    ("reason", "full membership without me"),
                ],
            );
            return Ok(false);
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::membership::version::SegmentVersion;

    fn id(n: u64) -> InstanceId {
        InstanceId::new(n)
    }

    #[test]
    fn test_membership_with_me_is_accepted() {
        let current = SegmentMembership::new(SegmentVersion::new(1, 0), id(1), [id(2), id(3)]).unwrap();
        let higher = current.add_arbiters(&[id(4)]);
        assert!(SegmentMembershipHelper::ok_to_update_to_higher_membership(&higher, &current, id(3), 3).unwrap());
    }

    #[test]
    fn test_full_membership_without_me_is_refused() {
        let current = SegmentMembership::new(SegmentVersion::new(1, 0), id(1), [id(2), id(3)]).unwrap();
        let higher = current.replace_secondary(id(3), id(4)).unwrap();
        assert!(!SegmentMembershipHelper::ok_to_update_to_higher_membership(&higher, &current, id(3), 3).unwrap());

        let shrunk = current.remove_secondary(id(3)).unwrap();
        assert!(SegmentMembershipHelper::ok_to_update_to_higher_membership(&shrunk, &current, id(3), 3).unwrap());
    }

    #[test]
    fn test_zero_total_members_is_fatal() {
        let current = SegmentMembership::new(SegmentVersion::new(1, 0), id(1), [id(2)]).unwrap();
        let err = SegmentMembershipHelper::ok_to_update_to_higher_membership(&current, &current, id(1), 0)
            .unwrap_err();
        assert!(err.is_fatal());
    }
}
