//! Segment membership
//!
//! The authoritative replica set of one segment. A membership is an
//! immutable value: every transition returns a new instance with a higher
//! version, or signals a no-op by returning `None` or an unchanged clone.
//!
//! Role sets are pairwise disjoint and never contain the primary. A
//! primary candidate is always one of the secondaries; a secondary
//! candidate is never already a member.
//!
//! Each instance also carries an ephemeral status map recording how every
//! member fared during I/O against this membership. The map is not part of
//! equality, hashing or the persisted content, and all updates to it go
//! through one lock.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Mutex;

use uuid::Uuid;

use super::errors::{MembershipError, MembershipResult};
use super::instance::InstanceId;
use super::member_io_status::MemberIoStatus;
use super::quorum::{self, RoleCounts};
use super::version::SegmentVersion;
use super::volume_type::VolumeType;
use crate::observability::{Event, Logger};

/// Sentinel for an absent id in the content format.
const ABSENT_ID: &str = "-1";

/// Number of comma separated fields in the content format.
const CONTENT_FIELDS: usize = 10;

/// Replica set of a segment.
#[derive(Debug)]
pub struct SegmentMembership {
    version: SegmentVersion,
    primary: InstanceId,
    temp_primary: Option<InstanceId>,
    secondaries: BTreeSet<InstanceId>,
    arbiters: BTreeSet<InstanceId>,
    inactive_secondaries: BTreeSet<InstanceId>,
    joining_secondaries: BTreeSet<InstanceId>,
    primary_candidate: Option<InstanceId>,
    secondary_candidate: Option<InstanceId>,
    /// Set by the primary once a quorum has adopted this membership.
    quorum_updated: AtomicBool,
    member_io_status: Mutex<HashMap<InstanceId, MemberIoStatus>>,
}

/// Validating constructor for `SegmentMembership`.
#[derive(Debug, Clone)]
pub struct SegmentMembershipBuilder {
    version: SegmentVersion,
    primary: InstanceId,
    temp_primary: Option<InstanceId>,
    secondaries: BTreeSet<InstanceId>,
    arbiters: BTreeSet<InstanceId>,
    inactive_secondaries: BTreeSet<InstanceId>,
    joining_secondaries: BTreeSet<InstanceId>,
    primary_candidate: Option<InstanceId>,
    secondary_candidate: Option<InstanceId>,
}

impl SegmentMembershipBuilder {
    pub fn version(mut self, version: SegmentVersion) -> Self {
        self.version = version;
        self
    }

    pub fn temp_primary(mut self, temp_primary: Option<InstanceId>) -> Self {
        self.temp_primary = temp_primary;
        self
    }

    pub fn secondaries(mut self, ids: impl IntoIterator<Item = InstanceId>) -> Self {
        self.secondaries = ids.into_iter().collect();
        self
    }

    pub fn arbiters(mut self, ids: impl IntoIterator<Item = InstanceId>) -> Self {
        self.arbiters = ids.into_iter().collect();
        self
    }

    pub fn inactive_secondaries(mut self, ids: impl IntoIterator<Item = InstanceId>) -> Self {
        self.inactive_secondaries = ids.into_iter().collect();
        self
    }

    pub fn joining_secondaries(mut self, ids: impl IntoIterator<Item = InstanceId>) -> Self {
        self.joining_secondaries = ids.into_iter().collect();
        self
    }

    pub fn primary_candidate(mut self, candidate: Option<InstanceId>) -> Self {
        self.primary_candidate = candidate;
        self
    }

    pub fn secondary_candidate(mut self, candidate: Option<InstanceId>) -> Self {
        self.secondary_candidate = candidate;
        self
    }

    /// Check the membership invariants and build.
    pub fn build(self) -> MembershipResult<SegmentMembership> {
        let sets: [(&str, &BTreeSet<InstanceId>); 4] = [
            ("secondaries", &self.secondaries),
            ("arbiters", &self.arbiters),
            ("inactive secondaries", &self.inactive_secondaries),
            ("joining secondaries", &self.joining_secondaries),
        ];

        for (name, set) in sets.iter() {
            if set.contains(&self.primary) {
                return Err(MembershipError::invariant_violation(format!(
                    "{} contain the primary {}",
                    name, self.primary
                )));
            }
        }
        for (i, (left_name, left)) in sets.iter().enumerate() {
            for (right_name, right) in sets.iter().skip(i + 1) {
                if let Some(id) = left.intersection(right).next() {
                    return Err(MembershipError::invariant_violation(format!(
                        "{} is in both {} and {}",
                        id, left_name, right_name
                    )));
                }
            }
        }

        if let Some(candidate) = self.primary_candidate {
            if !self.secondaries.contains(&candidate) {
                return Err(MembershipError::invariant_violation(format!(
                    "primary candidate {} is not a secondary",
                    candidate
                )));
            }
        }
        if let Some(candidate) = self.secondary_candidate {
            if candidate == self.primary || sets.iter().any(|(_, set)| set.contains(&candidate)) {
                return Err(MembershipError::invariant_violation(format!(
                    "secondary candidate {} is already a member",
                    candidate
                )));
            }
        }

        Ok(SegmentMembership::assemble(self))
    }
}

impl SegmentMembership {
    /// Start building a membership around `primary` at version (0, 0).
    pub fn builder(primary: InstanceId) -> SegmentMembershipBuilder {
        SegmentMembershipBuilder {
            version: SegmentVersion::default(),
            primary,
            temp_primary: None,
            secondaries: BTreeSet::new(),
            arbiters: BTreeSet::new(),
            inactive_secondaries: BTreeSet::new(),
            joining_secondaries: BTreeSet::new(),
            primary_candidate: None,
            secondary_candidate: None,
        }
    }

    /// A primary with plain secondaries.
    pub fn new(
        version: SegmentVersion,
        primary: InstanceId,
        secondaries: impl IntoIterator<Item = InstanceId>,
    ) -> MembershipResult<Self> {
        Self::builder(primary)
            .version(version)
            .secondaries(secondaries)
            .build()
    }

    fn assemble(b: SegmentMembershipBuilder) -> Self {
        let quorum_updated =
            b.secondaries.is_empty() && b.arbiters.is_empty() && b.joining_secondaries.is_empty();
        Self {
            version: b.version,
            primary: b.primary,
            temp_primary: b.temp_primary,
            secondaries: b.secondaries,
            arbiters: b.arbiters,
            inactive_secondaries: b.inactive_secondaries,
            joining_secondaries: b.joining_secondaries,
            primary_candidate: b.primary_candidate,
            secondary_candidate: b.secondary_candidate,
            quorum_updated: AtomicBool::new(quorum_updated),
            member_io_status: Mutex::new(HashMap::new()),
        }
    }

    /// A new membership at `version` derived from this one.
    ///
    /// The temp primary and both candidates are cleared unless `edit`
    /// sets them again.
    fn successor(
        &self,
        version: SegmentVersion,
        edit: impl FnOnce(&mut SegmentMembershipBuilder),
    ) -> Self {
        let mut draft = SegmentMembershipBuilder {
            version,
            primary: self.primary,
            temp_primary: None,
            secondaries: self.secondaries.clone(),
            arbiters: self.arbiters.clone(),
            inactive_secondaries: self.inactive_secondaries.clone(),
            joining_secondaries: self.joining_secondaries.clone(),
            primary_candidate: None,
            secondary_candidate: None,
        };
        edit(&mut draft);
        Self::assemble(draft)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn version(&self) -> SegmentVersion {
        self.version
    }

    pub fn primary(&self) -> InstanceId {
        self.primary
    }

    pub fn temp_primary(&self) -> Option<InstanceId> {
        self.temp_primary
    }

    pub fn secondaries(&self) -> &BTreeSet<InstanceId> {
        &self.secondaries
    }

    pub fn arbiters(&self) -> &BTreeSet<InstanceId> {
        &self.arbiters
    }

    pub fn inactive_secondaries(&self) -> &BTreeSet<InstanceId> {
        &self.inactive_secondaries
    }

    pub fn joining_secondaries(&self) -> &BTreeSet<InstanceId> {
        &self.joining_secondaries
    }

    pub fn primary_candidate(&self) -> Option<InstanceId> {
        self.primary_candidate
    }

    pub fn secondary_candidate(&self) -> Option<InstanceId> {
        self.secondary_candidate
    }

    pub fn is_quorum_updated(&self) -> bool {
        self.quorum_updated.load(AtomicOrdering::Relaxed)
    }

    pub fn set_quorum_updated(&self, updated: bool) {
        self.quorum_updated.store(updated, AtomicOrdering::Relaxed);
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    /// Secondaries, arbiters, inactive and joining secondaries.
    pub fn all_secondaries(&self) -> BTreeSet<InstanceId> {
        self.secondaries
            .iter()
            .chain(&self.arbiters)
            .chain(&self.inactive_secondaries)
            .chain(&self.joining_secondaries)
            .copied()
            .collect()
    }

    /// Secondaries, arbiters and joining secondaries.
    pub fn alive_secondaries(&self) -> BTreeSet<InstanceId> {
        self.secondaries
            .iter()
            .chain(&self.arbiters)
            .chain(&self.joining_secondaries)
            .copied()
            .collect()
    }

    pub fn alive_secondaries_without_arbiters_and_candidate(&self) -> BTreeSet<InstanceId> {
        self.write_secondaries()
    }

    pub fn secondaries_and_arbiters(&self) -> BTreeSet<InstanceId> {
        self.secondaries.union(&self.arbiters).copied().collect()
    }

    /// Members that receive writes besides the primary.
    pub fn write_secondaries(&self) -> BTreeSet<InstanceId> {
        self.secondaries
            .union(&self.joining_secondaries)
            .copied()
            .collect()
    }

    /// Members the primary exchanges heartbeats with.
    pub fn heartbeat_members(&self) -> BTreeSet<InstanceId> {
        let mut members = self.alive_secondaries();
        if let Some(candidate) = self.secondary_candidate {
            members.insert(candidate);
        }
        members
    }

    /// The primary and every secondary of any kind.
    pub fn members(&self) -> BTreeSet<InstanceId> {
        let mut members = self.all_secondaries();
        members.insert(self.primary);
        members
    }

    pub fn peer_instance_ids(&self, me: InstanceId) -> BTreeSet<InstanceId> {
        let mut peers = self.members();
        peers.remove(&me);
        peers
    }

    pub fn size(&self) -> usize {
        1 + self.secondaries.len()
            + self.arbiters.len()
            + self.inactive_secondaries.len()
            + self.joining_secondaries.len()
    }

    pub fn alive_size(&self) -> usize {
        1 + self.secondaries.len() + self.arbiters.len() + self.joining_secondaries.len()
    }

    // ------------------------------------------------------------------
    // Predicates
    // ------------------------------------------------------------------

    /// The id holds any role, including secondary candidate.
    pub fn contain(&self, id: InstanceId) -> bool {
        self.primary == id
            || self.secondaries.contains(&id)
            || self.arbiters.contains(&id)
            || self.inactive_secondaries.contains(&id)
            || self.joining_secondaries.contains(&id)
            || self.secondary_candidate == Some(id)
    }

    pub fn is_primary(&self, id: InstanceId) -> bool {
        self.primary == id
    }

    pub fn is_temp_primary(&self, id: InstanceId) -> bool {
        self.temp_primary == Some(id)
    }

    pub fn is_secondary(&self, id: InstanceId) -> bool {
        self.secondaries.contains(&id)
    }

    pub fn is_arbiter(&self, id: InstanceId) -> bool {
        self.arbiters.contains(&id)
    }

    pub fn is_joining_secondary(&self, id: InstanceId) -> bool {
        self.joining_secondaries.contains(&id)
    }

    pub fn is_inactive_secondary(&self, id: InstanceId) -> bool {
        self.inactive_secondaries.contains(&id)
    }

    /// Secondary, joining secondary or arbiter.
    pub fn is_alive_secondary(&self, id: InstanceId) -> bool {
        self.is_secondary(id) || self.is_joining_secondary(id) || self.is_arbiter(id)
    }

    pub fn is_primary_candidate(&self, id: InstanceId) -> bool {
        self.primary_candidate == Some(id)
    }

    pub fn is_secondary_candidate(&self, id: InstanceId) -> bool {
        self.secondary_candidate == Some(id)
    }

    /// Room for a new joining secondary: secondaries are missing and
    /// nobody is joining yet.
    pub fn allow_new_joining_secondary(&self, total_secondaries: usize) -> bool {
        self.secondaries.len() < total_secondaries && self.joining_secondaries.is_empty()
    }

    pub fn all_secondaries_present(&self, volume_type: VolumeType) -> bool {
        self.secondaries.len() == volume_type.num_secondaries() as usize
    }

    // ------------------------------------------------------------------
    // Version comparison
    // ------------------------------------------------------------------

    /// Order two memberships by version.
    ///
    /// Equal memberships compare equal. Different memberships sharing a
    /// version are an `InvalidMembership` error.
    pub fn compare_to(&self, other: &SegmentMembership) -> MembershipResult<Ordering> {
        if self == other {
            return Ok(Ordering::Equal);
        }
        match self.compare_version(other) {
            Ordering::Equal => Err(MembershipError::invalid_membership(format!(
                "the existing membership {} has the same version as {} but different members",
                self, other
            ))),
            ordering => Ok(ordering),
        }
    }

    pub fn compare_version(&self, other: &SegmentMembership) -> Ordering {
        self.version.cmp(&other.version)
    }

    pub fn compare_epoch(&self, other: &SegmentMembership) -> Ordering {
        if self == other {
            return Ordering::Equal;
        }
        self.version.epoch().cmp(&other.version.epoch())
    }

    pub fn compare_generation(&self, other: &SegmentMembership) -> Ordering {
        if self == other {
            return Ordering::Equal;
        }
        self.version.generation().cmp(&other.version.generation())
    }

    pub fn has_same_epoch_lower_generation(&self, other: &SegmentMembership) -> bool {
        self.version.epoch() == other.version.epoch()
            && self.version.generation() < other.version.generation()
    }

    pub fn has_same_epoch_higher_generation(&self, other: &SegmentMembership) -> bool {
        self.version.epoch() == other.version.epoch()
            && self.version.generation() > other.version.generation()
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Add plain secondaries. Ids that are already members are skipped.
    pub fn add_secondaries(&self, ids: &[InstanceId]) -> Self {
        let fresh = self.fresh_ids(ids, "add_secondaries");
        if fresh.is_empty() {
            return self.clone();
        }
        self.successor(self.version.inc_generation(), |m| {
            m.secondaries.extend(fresh);
        })
    }

    /// Add arbiters. Ids that are already members are skipped.
    pub fn add_arbiters(&self, ids: &[InstanceId]) -> Self {
        let fresh = self.fresh_ids(ids, "add_arbiters");
        if fresh.is_empty() {
            return self.clone();
        }
        self.successor(self.version.inc_generation(), |m| {
            m.arbiters.extend(fresh);
        })
    }

    fn fresh_ids(&self, ids: &[InstanceId], transition: &str) -> BTreeSet<InstanceId> {
        let mut fresh = BTreeSet::new();
        for id in ids {
            if self.contain(*id) {
                Logger::warn(
                    Event::TransitionRejected.as_str(),
                    &[
                        ("transition", transition),
                        ("instance", &id.to_string()),
                        ("reason", "already a member"),
                    ],
                );
            } else {
                fresh.insert(*id);
            }
        }
        fresh
    }

    /// Swap `old` (any non-primary role) for `new` as a plain secondary.
    pub fn replace_secondary(&self, old: InstanceId, new: InstanceId) -> Option<Self> {
        if !self.contain(old) || self.is_primary(old) || self.contain(new) {
            return None;
        }
        Some(self.successor(self.version.inc_generation(), |m| {
            m.secondaries.remove(&old);
            m.arbiters.remove(&old);
            m.inactive_secondaries.remove(&old);
            m.joining_secondaries.remove(&old);
            m.secondaries.insert(new);
        }))
    }

    pub fn remove_inactive_secondary_and_add_arbiter(
        &self,
        inactive: InstanceId,
        arbiter: InstanceId,
    ) -> Option<Self> {
        if !self.is_inactive_secondary(inactive) || (arbiter != inactive && self.contain(arbiter)) {
            return None;
        }
        Some(self.successor(self.version.inc_generation(), |m| {
            m.inactive_secondaries.remove(&inactive);
            m.arbiters.insert(arbiter);
        }))
    }

    pub fn remove_inactive_secondary_and_add_joining_secondary(
        &self,
        inactive: InstanceId,
        joining: InstanceId,
    ) -> Option<Self> {
        if !self.is_inactive_secondary(inactive) || (joining != inactive && self.contain(joining)) {
            return None;
        }
        Some(self.successor(self.version.inc_generation(), |m| {
            m.inactive_secondaries.remove(&inactive);
            m.joining_secondaries.insert(joining);
        }))
    }

    pub fn remove_secondary(&self, secondary: InstanceId) -> Option<Self> {
        if !self.is_secondary(secondary) {
            return None;
        }
        Some(self.successor(self.version.inc_generation(), |m| {
            m.secondaries.remove(&secondary);
        }))
    }

    pub fn remove_arbiter(&self, arbiter: InstanceId) -> Option<Self> {
        if !self.is_arbiter(arbiter) {
            return None;
        }
        Some(self.successor(self.version.inc_generation(), |m| {
            m.arbiters.remove(&arbiter);
        }))
    }

    /// Remove an inactive secondary for good. The quorum flag carries over.
    pub fn remove_inactive_secondary(&self, inactive: InstanceId) -> Self {
        if !self.is_inactive_secondary(inactive) {
            return self.clone();
        }
        let next = self.successor(self.version.inc_generation(), |m| {
            m.inactive_secondaries.remove(&inactive);
        });
        next.set_quorum_updated(self.is_quorum_updated());
        next
    }

    /// The voting result: `candidate` becomes (or stays) primary.
    ///
    /// Re-electing the current primary only moves to the next epoch. A
    /// secondary taking over demotes the old primary to secondary, or to
    /// inactive secondary when a temp primary was serving in between.
    pub fn new_primary_chosen(&self, candidate: InstanceId) -> Option<Self> {
        if self.is_primary(candidate) {
            return Some(self.successor(self.version.inc_epoch(), |_| {}));
        }
        if !self.is_secondary(candidate) {
            Logger::warn(
                Event::TransitionRejected.as_str(),
                &[
                    ("transition", "new_primary_chosen"),
                    ("instance", &candidate.to_string()),
                    ("membership", &self.to_string()),
                    ("reason", "not the primary or a secondary"),
                ],
            );
            return None;
        }

        let old_primary = self.primary;
        let had_temp_primary = self.temp_primary.is_some();
        Some(self.successor(self.version.inc_epoch(), |m| {
            m.primary = candidate;
            m.secondaries.remove(&candidate);
            if had_temp_primary {
                m.inactive_secondaries.insert(old_primary);
            } else {
                m.secondaries.insert(old_primary);
            }
        }))
    }

    /// Move an arbiter to the inactive secondaries. The temp primary stays.
    pub fn arbiter_become_inactive(&self, arbiter: InstanceId) -> Self {
        if !self.is_arbiter(arbiter) {
            return self.clone();
        }
        let temp = self.temp_primary;
        self.successor(self.version.inc_generation(), |m| {
            m.temp_primary = temp;
            m.arbiters.remove(&arbiter);
            m.inactive_secondaries.insert(arbiter);
        })
    }

    /// Move a secondary or joining secondary to the inactive secondaries.
    /// The temp primary stays.
    pub fn alive_secondary_become_inactive(&self, secondary: InstanceId) -> Self {
        if !self.is_secondary(secondary) && !self.is_joining_secondary(secondary) {
            return self.clone();
        }
        let temp = self.temp_primary;
        self.successor(self.version.inc_generation(), |m| {
            m.temp_primary = temp;
            m.secondaries.remove(&secondary);
            m.joining_secondaries.remove(&secondary);
            m.inactive_secondaries.insert(secondary);
        })
    }

    /// Add a joining secondary.
    ///
    /// Adding an existing joining secondary is a no-op; adding an id that
    /// holds another role is an invariant violation.
    pub fn add_joining_secondary(&self, joining: InstanceId) -> MembershipResult<Self> {
        if self.is_joining_secondary(joining) {
            return Ok(self.clone());
        }
        if self.contain(joining) {
            return Err(MembershipError::invariant_violation(format!(
                "{} cannot join {}: already a member",
                joining, self
            )));
        }
        Ok(self.successor(self.version.inc_generation(), |m| {
            m.joining_secondaries.insert(joining);
        }))
    }

    pub fn joining_secondary_become_secondary(&self, joining: InstanceId) -> Self {
        if !self.is_joining_secondary(joining) {
            return self.clone();
        }
        self.successor(self.version.inc_generation(), |m| {
            m.joining_secondaries.remove(&joining);
            m.secondaries.insert(joining);
        })
    }

    pub fn joining_secondary_become_inactive(&self, joining: InstanceId) -> Self {
        if !self.is_joining_secondary(joining) {
            return self.clone();
        }
        self.successor(self.version.inc_generation(), |m| {
            m.joining_secondaries.remove(&joining);
            m.inactive_secondaries.insert(joining);
        })
    }

    pub fn inactive_secondary_become_joining(&self, inactive: InstanceId) -> Self {
        if !self.is_inactive_secondary(inactive) {
            return self.clone();
        }
        self.successor(self.version.inc_generation(), |m| {
            m.inactive_secondaries.remove(&inactive);
            m.joining_secondaries.insert(inactive);
        })
    }

    pub fn inactive_secondary_become_arbiter(&self, inactive: InstanceId) -> Self {
        if !self.is_inactive_secondary(inactive) {
            return self.clone();
        }
        self.successor(self.version.inc_generation(), |m| {
            m.inactive_secondaries.remove(&inactive);
            m.arbiters.insert(inactive);
        })
    }

    /// First phase of a planned primary switch.
    pub fn secondary_become_primary_candidate(&self, secondary: InstanceId) -> Option<Self> {
        if !self.is_secondary(secondary) || self.primary_candidate.is_some() {
            return None;
        }
        Some(self.successor(self.version.inc_generation(), |m| {
            m.primary_candidate = Some(secondary);
        }))
    }

    /// Second phase: the candidate takes over and the old primary becomes
    /// a secondary.
    pub fn primary_candidate_become_primary(&self, candidate: InstanceId) -> Option<Self> {
        if !self.is_secondary(candidate) || !self.is_primary_candidate(candidate) {
            return None;
        }
        let old_primary = self.primary;
        Some(self.successor(self.version.inc_epoch(), |m| {
            m.primary = candidate;
            m.secondaries.remove(&candidate);
            m.secondaries.insert(old_primary);
        }))
    }

    /// Let a secondary serve as temp primary without touching the formal
    /// primary.
    ///
    /// The generation jumps by one more than the number of secondaries of
    /// any kind, beyond anything the old primary can still reach on its
    /// own from the current version.
    pub fn secondary_become_temp_primary(&self, secondary: InstanceId) -> Option<Self> {
        let increment = 1 + self.all_secondaries().len() as u64;
        self.secondary_become_temp_primary_with_increment(secondary, increment)
    }

    pub fn secondary_become_temp_primary_with_increment(
        &self,
        secondary: InstanceId,
        increment: u64,
    ) -> Option<Self> {
        if !self.is_secondary(secondary) {
            return None;
        }
        Some(self.successor(self.version.add_generation(increment), |m| {
            m.temp_primary = Some(secondary);
        }))
    }

    /// Record the outcome of a primary pre-election.
    ///
    /// Keeps the temp primary only when it is the selected member.
    pub fn potential_primary_selected(&self, potential_primary: InstanceId) -> Self {
        let increment = 1 + self.all_secondaries().len() as u64;
        let temp = self.temp_primary.filter(|tp| *tp == potential_primary);
        self.successor(self.version.add_generation(increment), |m| {
            m.temp_primary = temp;
        })
    }

    /// Register a new instance that will replace a member.
    pub fn add_secondary_candidate(&self, candidate: InstanceId) -> MembershipResult<Self> {
        if self.is_secondary_candidate(candidate) {
            return Ok(self.clone());
        }
        if self.contain(candidate) {
            return Err(MembershipError::invariant_violation(format!(
                "secondary candidate {} is already a member of {}",
                candidate, self
            )));
        }
        Ok(self.successor(self.version.inc_generation(), |m| {
            m.secondary_candidate = Some(candidate);
        }))
    }

    pub fn remove_secondary_candidate(&self, candidate: InstanceId) -> Self {
        if !self.is_secondary_candidate(candidate) {
            return self.clone();
        }
        self.successor(self.version.inc_generation(), |_| {})
    }

    pub fn secondary_candidate_becomes_joining(&self, candidate: InstanceId) -> Self {
        if !self.is_secondary_candidate(candidate) {
            return self.clone();
        }
        self.successor(self.version.inc_generation(), |m| {
            m.joining_secondaries.insert(candidate);
        })
    }

    /// Promote the secondary candidate and evict `replacee` from whichever
    /// set held it, in one step.
    pub fn secondary_candidate_becomes_secondary_and_remove_the_replacee(
        &self,
        candidate: InstanceId,
        replacee: InstanceId,
    ) -> Self {
        let holds_replacee = self.is_secondary(replacee)
            || self.is_inactive_secondary(replacee)
            || self.is_joining_secondary(replacee);
        if !self.is_secondary_candidate(candidate) || !holds_replacee {
            return self.clone();
        }
        self.successor(self.version.inc_generation(), |m| {
            m.secondaries.remove(&replacee);
            m.inactive_secondaries.remove(&replacee);
            m.joining_secondaries.remove(&replacee);
            m.secondaries.insert(candidate);
        })
    }

    // ------------------------------------------------------------------
    // Quorum arithmetic
    // ------------------------------------------------------------------

    /// Secondaries, joining secondaries and arbiters a write is sent to.
    /// The temp primary takes the primary's place and is not counted.
    fn broadcast_counts(&self) -> RoleCounts {
        let secondaries = self
            .secondaries
            .len()
            .saturating_sub(usize::from(self.temp_primary.is_some()));
        RoleCounts::new(
            secondaries as u32,
            self.joining_secondaries.len() as u32,
            self.arbiters.len() as u32,
        )
    }

    /// Whether the good acknowledgements complete a write.
    pub fn check_write_result_of_secondaries_and_arbiters(
        &self,
        write_quorum_size: u32,
        good_secondaries: u32,
        good_joining: u32,
        good_arbiters: u32,
    ) -> bool {
        quorum::check_write_quorum(
            write_quorum_size,
            self.broadcast_counts(),
            RoleCounts::new(good_secondaries, good_joining, good_arbiters),
        )
    }

    /// Whether the failures so far make the write impossible, assuming
    /// every member yet to answer answers well.
    pub fn check_bad_write_result_of_secondaries_and_arbiters(
        &self,
        write_quorum_size: u32,
        bad_secondaries: u32,
        bad_joining: u32,
        bad_arbiters: u32,
    ) -> bool {
        quorum::check_bad_write_quorum(
            write_quorum_size,
            self.broadcast_counts(),
            RoleCounts::new(bad_secondaries, bad_joining, bad_arbiters),
        )
    }

    // ------------------------------------------------------------------
    // Member I/O status
    // ------------------------------------------------------------------

    fn initial_status(&self, id: InstanceId) -> Option<MemberIoStatus> {
        if self.is_primary(id) {
            Some(MemberIoStatus::Primary)
        } else if self.is_temp_primary(id) {
            Some(MemberIoStatus::TempPrimary)
        } else if self.is_secondary(id) {
            Some(MemberIoStatus::Secondary)
        } else if self.is_joining_secondary(id) {
            Some(MemberIoStatus::JoiningSecondary)
        } else if self.is_arbiter(id) {
            Some(MemberIoStatus::Arbiter)
        } else if self.is_inactive_secondary(id) {
            Logger::warn(
                Event::InactiveMemberStatus.as_str(),
                &[("instance", &id.to_string()), ("version", &self.version.to_string())],
            );
            Some(MemberIoStatus::InactiveSecondary)
        } else {
            None
        }
    }

    fn status_entry(
        &self,
        map: &mut HashMap<InstanceId, MemberIoStatus>,
        id: InstanceId,
    ) -> MembershipResult<MemberIoStatus> {
        if let Some(status) = map.get(&id) {
            return Ok(*status);
        }
        let status = self.initial_status(id).ok_or_else(|| {
            MembershipError::unknown_member(format!("{} has no role in {}", id, self))
        })?;
        map.insert(id, status);
        Ok(status)
    }

    /// Current status of a member, initialised from its role on first use.
    pub fn get_member_io_status(&self, id: InstanceId) -> MembershipResult<MemberIoStatus> {
        let mut map = self.member_io_status.lock().unwrap();
        self.status_entry(&mut map, id)
    }

    /// Record a new status for a member.
    ///
    /// Only legal moves are applied; an illegal one is logged and ignored.
    /// Returns whether the status was applied.
    pub fn mark_member_io_status(
        &self,
        id: InstanceId,
        status: MemberIoStatus,
    ) -> MembershipResult<bool> {
        if !self.contain(id) {
            return Err(MembershipError::unknown_member(format!(
                "cannot mark {} as {}: not in {}",
                id, status, self
            )));
        }

        let mut map = self.member_io_status.lock().unwrap();
        let current = self.status_entry(&mut map, id)?;
        if current.can_move_to(status) {
            map.insert(id, status);
            Ok(true)
        } else {
            Logger::warn(
                Event::StatusMoveRejected.as_str(),
                &[
                    ("instance", &id.to_string()),
                    ("from", current.state_name()),
                    ("to", status.state_name()),
                ],
            );
            Ok(false)
        }
    }

    /// Snapshot of the statuses recorded so far.
    pub fn member_io_statuses(&self) -> HashMap<InstanceId, MemberIoStatus> {
        self.member_io_status.lock().unwrap().clone()
    }

    /// Fold the statuses observed on an equal membership into this one.
    ///
    /// Inactive secondaries of `other` are skipped.
    pub fn merge_member_status(
        &self,
        request_id: Uuid,
        other: &SegmentMembership,
    ) -> MembershipResult<()> {
        if self.compare_to(other)? != Ordering::Equal {
            return Err(MembershipError::invalid_membership(format!(
                "cannot merge statuses of {} into {}: versions differ",
                other, self
            )));
        }

        for member in other.members() {
            if other.is_inactive_secondary(member) {
                continue;
            }
            let theirs = other.get_member_io_status(member)?;
            let mine = self.get_member_io_status(member)?;
            let merged = mine.merge(theirs);
            if merged != mine {
                Logger::warn(
                    Event::StatusMerged.as_str(),
                    &[
                        ("request_id", &request_id.to_string()),
                        ("instance", &member.to_string()),
                        ("mine", mine.state_name()),
                        ("theirs", theirs.state_name()),
                        ("merged", merged.state_name()),
                    ],
                );
                self.mark_member_io_status(member, merged)?;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Content codec
    // ------------------------------------------------------------------

    /// Flat persisted form:
    /// `epoch,generation,primary,tempPrimary,secondaries,arbiters,inactive,joining,primaryCandidate,secondaryCandidate`
    /// with sets joined by `:` and absent ids written as `-1`.
    pub fn serialize_to_content(&self) -> String {
        let id = |id: Option<InstanceId>| id.map_or(ABSENT_ID.to_string(), |id| id.to_string());
        let set = |ids: &BTreeSet<InstanceId>| {
            ids.iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(":")
        };

        [
            self.version.epoch().to_string(),
            self.version.generation().to_string(),
            self.primary.to_string(),
            id(self.temp_primary),
            set(&self.secondaries),
            set(&self.arbiters),
            set(&self.inactive_secondaries),
            set(&self.joining_secondaries),
            id(self.primary_candidate),
            id(self.secondary_candidate),
        ]
        .join(",")
    }

    /// Decode the flat persisted form.
    pub fn deserialize_from_content(content: &str) -> MembershipResult<Self> {
        let fields: Vec<&str> = content.trim().split(',').collect();
        if fields.len() != CONTENT_FIELDS {
            return Err(MembershipError::malformed_content(format!(
                "expected {} fields, found {} in {:?}",
                CONTENT_FIELDS,
                fields.len(),
                content
            )));
        }

        let epoch = parse_number(fields[0], "epoch")?;
        let generation = parse_number(fields[1], "generation")?;
        let primary = parse_optional_id(fields[2], "primary")?.ok_or_else(|| {
            MembershipError::malformed_content(format!("no primary in {:?}", content))
        })?;

        Self::builder(primary)
            .version(SegmentVersion::new(epoch, generation))
            .temp_primary(parse_optional_id(fields[3], "temp primary")?)
            .secondaries(parse_id_set(fields[4])?)
            .arbiters(parse_id_set(fields[5])?)
            .inactive_secondaries(parse_id_set(fields[6])?)
            .joining_secondaries(parse_id_set(fields[7])?)
            .primary_candidate(parse_optional_id(fields[8], "primary candidate")?)
            .secondary_candidate(parse_optional_id(fields[9], "secondary candidate")?)
            .build()
    }
}

fn parse_number(field: &str, name: &str) -> MembershipResult<u64> {
    field.trim().parse::<u64>().map_err(|e| {
        MembershipError::malformed_content(format!("bad {} {:?}: {}", name, field, e))
    })
}

/// `-1` decodes to `None`; any other field must be a full id.
fn parse_optional_id(field: &str, name: &str) -> MembershipResult<Option<InstanceId>> {
    let field = field.trim();
    if field == ABSENT_ID {
        return Ok(None);
    }
    field.parse::<u64>().map(|n| Some(InstanceId::new(n))).map_err(|e| {
        MembershipError::malformed_content(format!("bad {} {:?}: {}", name, field, e))
    })
}

fn parse_id_set(field: &str) -> MembershipResult<BTreeSet<InstanceId>> {
    if field.is_empty() {
        return Ok(BTreeSet::new());
    }
    field.split(':').map(|id| id.parse::<InstanceId>()).collect()
}

impl Clone for SegmentMembership {
    fn clone(&self) -> Self {
        Self {
            version: self.version,
            primary: self.primary,
            temp_primary: self.temp_primary,
            secondaries: self.secondaries.clone(),
            arbiters: self.arbiters.clone(),
            inactive_secondaries: self.inactive_secondaries.clone(),
            joining_secondaries: self.joining_secondaries.clone(),
            primary_candidate: self.primary_candidate,
            secondary_candidate: self.secondary_candidate,
            quorum_updated: AtomicBool::new(self.is_quorum_updated()),
            member_io_status: Mutex::new(self.member_io_statuses()),
        }
    }
}

impl PartialEq for SegmentMembership {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
            && self.primary == other.primary
            && self.temp_primary == other.temp_primary
            && self.secondaries == other.secondaries
            && self.arbiters == other.arbiters
            && self.inactive_secondaries == other.inactive_secondaries
            && self.joining_secondaries == other.joining_secondaries
            && self.primary_candidate == other.primary_candidate
            && self.secondary_candidate == other.secondary_candidate
    }
}

impl Eq for SegmentMembership {}

impl Hash for SegmentMembership {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.version.hash(state);
        self.primary.hash(state);
        self.temp_primary.hash(state);
        self.secondaries.hash(state);
        self.arbiters.hash(state);
        self.inactive_secondaries.hash(state);
        self.joining_secondaries.hash(state);
        self.primary_candidate.hash(state);
        self.secondary_candidate.hash(state);
    }
}

impl fmt::Display for SegmentMembership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SegmentMembership{{{}, primary={}", self.version, self.primary)?;
        if let Some(tp) = self.temp_primary {
            write!(f, ", tempPrimary={}", tp)?;
        }
        let sets = [
            ("secondaries", &self.secondaries),
            ("arbiters", &self.arbiters),
            ("inactiveSecondaries", &self.inactive_secondaries),
            ("joiningSecondaries", &self.joining_secondaries),
        ];
        for (name, set) in sets {
            if !set.is_empty() {
                let ids: Vec<String> = set.iter().map(|id| id.to_string()).collect();
                write!(f, ", {}=[{}]", name, ids.join(", "))?;
            }
        }
        if let Some(candidate) = self.secondary_candidate {
            write!(f, ", secondaryCandidate={}", candidate)?;
        }
        if let Some(candidate) = self.primary_candidate {
            write!(f, ", primaryCandidate={}", candidate)?;
        }
        write!(f, ", quorumUpdated={}}}", self.is_quorum_updated())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u64) -> InstanceId {
        InstanceId::new(n)
    }

    fn pss() -> SegmentMembership {
        SegmentMembership::new(SegmentVersion::new(1, 0), id(1), [id(2), id(3)]).unwrap()
    }

    #[test]
    fn test_builder_rejects_overlaps() {
        let err = SegmentMembership::new(SegmentVersion::default(), id(1), [id(1)]).unwrap_err();
        assert!(err.is_fatal());

        let err = SegmentMembership::builder(id(1))
            .secondaries([id(2)])
            .arbiters([id(2)])
            .build()
            .unwrap_err();
        assert!(err.is_fatal());

        assert!(SegmentMembership::builder(id(1))
            .secondaries([id(2)])
            .primary_candidate(Some(id(3)))
            .build()
            .is_err());

        assert!(SegmentMembership::builder(id(1))
            .secondaries([id(2)])
            .secondary_candidate(Some(id(2)))
            .build()
            .is_err());
    }

    #[test]
    fn test_sizes_and_views() {
        let m = SegmentMembership::builder(id(1))
            .secondaries([id(2)])
            .arbiters([id(3)])
            .inactive_secondaries([id(4)])
            .joining_secondaries([id(5)])
            .build()
            .unwrap();
        assert_eq!(m.size(), 5);
        assert_eq!(m.alive_size(), 4);
        assert_eq!(m.all_secondaries().len(), 4);
        assert_eq!(m.alive_secondaries().len(), 3);
        assert_eq!(m.write_secondaries(), [id(2), id(5)].into_iter().collect());
        assert_eq!(m.secondaries_and_arbiters(), [id(2), id(3)].into_iter().collect());
        assert_eq!(m.peer_instance_ids(id(1)).len(), 4);
        assert!(m.is_alive_secondary(id(3)));
        assert!(!m.is_alive_secondary(id(4)));
    }

    #[test]
    fn test_quorum_updated_for_lone_primary() {
        let lone = SegmentMembership::builder(id(1))
            .inactive_secondaries([id(2)])
            .build()
            .unwrap();
        assert!(lone.is_quorum_updated());
        assert!(!pss().is_quorum_updated());
    }

    #[test]
    fn test_add_secondaries_no_change_keeps_version() {
        let m = pss();
        let same = m.add_secondaries(&[id(2)]);
        assert_eq!(same, m);

        let grown = m.add_secondaries(&[id(4)]);
        assert_eq!(grown.version(), SegmentVersion::new(1, 1));
        assert!(grown.is_secondary(id(4)));
    }

    #[test]
    fn test_compare_to_same_version_different_content() {
        let a = pss();
        let b = SegmentMembership::new(SegmentVersion::new(1, 0), id(1), [id(2), id(4)]).unwrap();
        let err = a.compare_to(&b).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(a.compare_to(&a.clone()).unwrap(), Ordering::Equal);

        let newer = a.add_secondaries(&[id(5)]);
        assert_eq!(newer.compare_to(&a).unwrap(), Ordering::Greater);
        assert_eq!(a.compare_to(&newer).unwrap(), Ordering::Less);
        assert!(a.has_same_epoch_lower_generation(&newer));
        assert!(newer.has_same_epoch_higher_generation(&a));
    }

    #[test]
    fn test_content_round_trip_with_empty_sets() {
        let lone = SegmentMembership::new(SegmentVersion::new(3, 7), id(9), std::iter::empty()).unwrap();
        let content = lone.serialize_to_content();
        assert_eq!(content, "3,7,9,-1,,,,,-1,-1");
        assert_eq!(SegmentMembership::deserialize_from_content(&content).unwrap(), lone);
    }

    #[test]
    fn test_content_decoding_errors() {
        let short = SegmentMembership::deserialize_from_content("1,2,3").unwrap_err();
        assert!(!short.is_fatal());
        assert!(SegmentMembership::deserialize_from_content("1,0,-1,-1,,,,,-1,-1").is_err());
        assert!(SegmentMembership::deserialize_from_content("1,0,1,-1,x,,,,-1,-1").is_err());
        assert!(SegmentMembership::deserialize_from_content("1,0,1,-2,,,,,-1,-1").is_err());
    }

    #[test]
    fn test_content_round_trip_with_edge_ids() {
        let wide = SegmentMembership::new(SegmentVersion::new(1, 0), id(1), [id(2), id(u64::MAX)])
            .unwrap()
            .secondary_become_temp_primary(id(u64::MAX))
            .unwrap();
        let content = wide.serialize_to_content();
        assert_eq!(content, "1,3,1,18446744073709551615,2:18446744073709551615,,,,-1,-1");
        assert_eq!(SegmentMembership::deserialize_from_content(&content).unwrap(), wide);

        let zero = SegmentMembership::new(SegmentVersion::new(1, 0), id(0), [id(2), id(3)]).unwrap();
        let content = zero.serialize_to_content();
        assert_eq!(content, "1,0,0,-1,2:3,,,,-1,-1");
        let decoded = SegmentMembership::deserialize_from_content(&content).unwrap();
        assert_eq!(decoded, zero);
        assert_eq!(decoded.primary(), id(0));

        let candidate = zero.secondary_become_primary_candidate(id(3)).unwrap();
        let decoded =
            SegmentMembership::deserialize_from_content(&candidate.serialize_to_content()).unwrap();
        assert_eq!(decoded.primary_candidate(), Some(id(3)));
        assert_eq!(decoded, candidate);
    }

    #[test]
    fn test_status_map_lazy_init_and_moves() {
        let m = pss().secondary_become_temp_primary(id(2)).unwrap();
        assert_eq!(m.get_member_io_status(id(1)).unwrap(), MemberIoStatus::Primary);
        assert_eq!(m.get_member_io_status(id(2)).unwrap(), MemberIoStatus::TempPrimary);
        assert_eq!(m.get_member_io_status(id(3)).unwrap(), MemberIoStatus::Secondary);
        assert!(m.get_member_io_status(id(42)).unwrap_err().is_fatal());

        assert!(m.mark_member_io_status(id(3), MemberIoStatus::SecondaryDown).unwrap());
        // down never comes back up on the same membership
        assert!(!m.mark_member_io_status(id(3), MemberIoStatus::Secondary).unwrap());
        assert_eq!(m.get_member_io_status(id(3)).unwrap(), MemberIoStatus::SecondaryDown);
        assert!(m.mark_member_io_status(id(42), MemberIoStatus::Secondary).is_err());
    }

    #[test]
    fn test_status_map_not_part_of_equality() {
        let a = pss();
        let b = pss();
        a.mark_member_io_status(id(2), MemberIoStatus::SecondaryDown).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.clone().get_member_io_status(id(2)).unwrap(), MemberIoStatus::SecondaryDown);
    }

    #[test]
    fn test_merge_member_status() {
        let mine = pss();
        let theirs = pss();
        theirs.mark_member_io_status(id(3), MemberIoStatus::SecondaryReadDown).unwrap();
        mine.merge_member_status(Uuid::new_v4(), &theirs).unwrap();
        assert_eq!(mine.get_member_io_status(id(3)).unwrap(), MemberIoStatus::SecondaryReadDown);
        assert_eq!(mine.get_member_io_status(id(2)).unwrap(), MemberIoStatus::Secondary);

        let other_version = pss().add_secondaries(&[id(4)]);
        assert!(mine.merge_member_status(Uuid::new_v4(), &other_version).is_err());
    }

    #[test]
    fn test_check_write_result_excludes_temp_primary() {
        let m = SegmentMembership::builder(id(1))
            .secondaries([id(2), id(3)])
            .arbiters([id(4), id(5)])
            .build()
            .unwrap();
        assert!(m.check_write_result_of_secondaries_and_arbiters(3, 2, 0, 0));
        assert!(!m.check_write_result_of_secondaries_and_arbiters(3, 1, 0, 2));

        let tp = m.secondary_become_temp_primary(id(2)).unwrap();
        // only one secondary is written to, an arbiter completes the quorum
        assert!(tp.check_write_result_of_secondaries_and_arbiters(3, 1, 0, 1));
        assert!(tp.check_bad_write_result_of_secondaries_and_arbiters(3, 1, 0, 0));
        assert!(!tp.check_bad_write_result_of_secondaries_and_arbiters(3, 0, 0, 1));
    }
}
