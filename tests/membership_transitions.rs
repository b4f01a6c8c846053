//! Membership Transition Tests
//!
//! End-to-end role changes of a segment replica set:
//! - every applied transition strictly raises the version
//! - refused transitions leave no trace
//! - the content codec carries every role through

use segquorum::membership::{
    InstanceId, SegmentMembership, SegmentMembershipHelper, SegmentVersion, VolumeType,
};
use std::cmp::Ordering;

// =============================================================================
// Test Utilities
// =============================================================================

fn id(n: u64) -> InstanceId {
    InstanceId::new(n)
}

fn pss() -> SegmentMembership {
    SegmentMembership::new(SegmentVersion::new(1, 0), id(1), [id(2), id(3)]).unwrap()
}

fn assert_newer(next: &SegmentMembership, prev: &SegmentMembership) {
    assert_eq!(next.compare_to(prev).unwrap(), Ordering::Greater);
}

// =============================================================================
// Failover
// =============================================================================

#[test]
fn test_failover_through_temp_primary() {
    let start = pss();

    let temp = start.secondary_become_temp_primary(id(2)).unwrap();
    assert_eq!(temp.version(), SegmentVersion::new(1, 3));
    assert!(temp.is_temp_primary(id(2)));
    assert!(temp.is_secondary(id(2)));
    assert!(temp.is_primary(id(1)));

    // losing the other secondary keeps the temp primary serving
    let degraded = temp.alive_secondary_become_inactive(id(3));
    assert_newer(&degraded, &temp);
    assert_eq!(degraded.temp_primary(), Some(id(2)));

    let elected = degraded.new_primary_chosen(id(2)).unwrap();
    assert_eq!(elected.version(), SegmentVersion::new(2, 0));
    assert!(elected.is_primary(id(2)));
    assert_eq!(elected.temp_primary(), None);
    // bypassed by a temp primary, the old primary comes back inactive
    assert!(elected.is_inactive_secondary(id(1)));
    assert!(elected.is_inactive_secondary(id(3)));
    assert!(elected.secondaries().is_empty());
}

#[test]
fn test_reelecting_primary_moves_epoch_only() {
    let start = pss();
    let next = start.new_primary_chosen(id(1)).unwrap();
    assert_eq!(next.version(), SegmentVersion::new(2, 0));
    assert_eq!(next.secondaries(), start.secondaries());
    assert!(start.new_primary_chosen(id(9)).is_none());
}

#[test]
fn test_planned_primary_switch() {
    let start = pss();
    let candidate = start.secondary_become_primary_candidate(id(3)).unwrap();
    assert!(candidate.is_primary_candidate(id(3)));
    // only one candidate at a time
    assert!(candidate.secondary_become_primary_candidate(id(2)).is_none());
    assert!(candidate.primary_candidate_become_primary(id(2)).is_none());

    let switched = candidate.primary_candidate_become_primary(id(3)).unwrap();
    assert!(switched.is_primary(id(3)));
    assert!(switched.is_secondary(id(1)));
    assert!(switched.is_secondary(id(2)));
    assert_eq!(switched.primary_candidate(), None);
    assert_eq!(switched.version().epoch(), 2);
}

#[test]
fn test_potential_primary_selected() {
    let temp = pss().secondary_become_temp_primary(id(2)).unwrap();

    let kept = temp.potential_primary_selected(id(2));
    assert_eq!(kept.temp_primary(), Some(id(2)));
    assert_eq!(kept.version(), SegmentVersion::new(1, 6));

    let dropped = temp.potential_primary_selected(id(3));
    assert_eq!(dropped.temp_primary(), None);
}

// =============================================================================
// Replacement and rejoin
// =============================================================================

#[test]
fn test_secondary_candidate_replaces_member() {
    let start = pss().alive_secondary_become_inactive(id(3));

    let with_candidate = start.add_secondary_candidate(id(4)).unwrap();
    assert!(with_candidate.contain(id(4)));
    assert!(with_candidate.heartbeat_members().contains(&id(4)));
    // adding the same candidate again is a no-op
    assert_eq!(with_candidate.add_secondary_candidate(id(4)).unwrap(), with_candidate);
    // an existing member can never become the candidate
    assert!(with_candidate.add_secondary_candidate(id(2)).unwrap_err().is_fatal());

    let replaced =
        with_candidate.secondary_candidate_becomes_secondary_and_remove_the_replacee(id(4), id(3));
    assert_newer(&replaced, &with_candidate);
    assert!(replaced.is_secondary(id(4)));
    assert!(!replaced.contain(id(3)));
    assert_eq!(replaced.secondary_candidate(), None);
    assert!(replaced.all_secondaries_present(VolumeType::Regular));
}

#[test]
fn test_inactive_secondary_rejoins() {
    let start = pss().alive_secondary_become_inactive(id(3));
    assert!(start.allow_new_joining_secondary(2));

    let joining = start.inactive_secondary_become_joining(id(3));
    assert!(joining.is_joining_secondary(id(3)));
    assert!(!joining.allow_new_joining_secondary(2));
    assert_eq!(joining.write_secondaries().len(), 2);

    let back = joining.joining_secondary_become_secondary(id(3));
    assert!(back.is_secondary(id(3)));
    assert_eq!(back.version(), SegmentVersion::new(1, 3));
}

#[test]
fn test_inactive_slot_reused_by_new_instance() {
    let start = pss().alive_secondary_become_inactive(id(3));
    let joined = start
        .remove_inactive_secondary_and_add_joining_secondary(id(3), id(5))
        .unwrap();
    assert!(joined.is_joining_secondary(id(5)));
    assert!(!joined.contain(id(3)));

    // the new id must not hold another role already
    assert!(start
        .remove_inactive_secondary_and_add_joining_secondary(id(3), id(2))
        .is_none());
    assert!(start.remove_inactive_secondary_and_add_arbiter(id(9), id(6)).is_none());
}

#[test]
fn test_refused_transitions_leave_no_trace() {
    let start = pss();
    assert_eq!(start.joining_secondary_become_secondary(id(2)), start);
    assert_eq!(start.arbiter_become_inactive(id(2)), start);
    assert_eq!(start.remove_inactive_secondary(id(2)), start);
    assert_eq!(start.add_secondaries(&[id(2), id(3)]), start);
    assert!(start.remove_arbiter(id(2)).is_none());
    assert!(start.replace_secondary(id(1), id(4)).is_none());
}

#[test]
fn test_add_joining_secondary_conflict_is_fatal() {
    let start = pss();
    let err = start.add_joining_secondary(id(3)).unwrap_err();
    assert!(err.is_fatal());
    let joined = start.add_joining_secondary(id(4)).unwrap();
    assert_eq!(joined.add_joining_secondary(id(4)).unwrap(), joined);
}

// =============================================================================
// Versions, codec and admission
// =============================================================================

#[test]
fn test_same_version_different_members_is_invalid() {
    let a = pss();
    let b = SegmentMembership::new(SegmentVersion::new(1, 0), id(1), [id(2), id(4)]).unwrap();
    assert!(a.compare_to(&b).unwrap_err().is_fatal());
    assert_eq!(a.compare_version(&b), Ordering::Equal);
}

#[test]
fn test_content_carries_every_role() {
    let membership = SegmentMembership::builder(id(10))
        .version(SegmentVersion::new(4, 17))
        .temp_primary(Some(id(11)))
        .secondaries([id(11), id(12)])
        .arbiters([id(13)])
        .inactive_secondaries([id(14)])
        .joining_secondaries([id(15)])
        .primary_candidate(Some(id(12)))
        .secondary_candidate(Some(id(16)))
        .build()
        .unwrap();

    let content = membership.serialize_to_content();
    assert_eq!(content, "4,17,10,11,11:12,13,14,15,12,16");
    let decoded = SegmentMembership::deserialize_from_content(&content).unwrap();
    assert_eq!(decoded, membership);
    assert_eq!(decoded.size(), 6);
    assert_eq!(decoded.alive_size(), 5);
}

#[test]
fn test_replaced_instance_refuses_full_membership() {
    let current = pss();
    let higher = current.replace_secondary(id(3), id(4)).unwrap();
    assert!(!SegmentMembershipHelper::ok_to_update_to_higher_membership(
        &higher, &current, id(3), 3
    )
    .unwrap());
    assert!(SegmentMembershipHelper::ok_to_update_to_higher_membership(
        &higher, &current, id(2), 3
    )
    .unwrap());
}
