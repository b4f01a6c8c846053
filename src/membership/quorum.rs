//! Generic write-quorum arithmetic
//!
//! The primary always counts as one vote, so the remaining members must
//! supply `write_quorum_size - 1` acknowledgements. Evidence is consulted
//! in strict priority order: secondaries, then joining secondaries, then
//! arbiters (which hold no data and are the weakest evidence).

/// Number of members per non-primary alive role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoleCounts {
    pub secondaries: u32,
    pub joining: u32,
    pub arbiters: u32,
}

impl RoleCounts {
    pub fn new(secondaries: u32, joining: u32, arbiters: u32) -> Self {
        Self {
            secondaries,
            joining,
            arbiters,
        }
    }

    /// Members of `self` that are not in `bad`.
    pub fn remaining_after(&self, bad: RoleCounts) -> RoleCounts {
        RoleCounts {
            secondaries: self.secondaries.saturating_sub(bad.secondaries),
            joining: self.joining.saturating_sub(bad.joining),
            arbiters: self.arbiters.saturating_sub(bad.arbiters),
        }
    }
}

/// Decide whether `good` acknowledgements satisfy the write quorum.
///
/// `total` caps what each role can contribute: every secondary that exists
/// (up to the sub-quorum) must have acknowledged before joining secondaries
/// are looked at, and likewise for joining secondaries before arbiters.
pub fn check_write_quorum(write_quorum_size: u32, total: RoleCounts, good: RoleCounts) -> bool {
    let sub_quorum = write_quorum_size.saturating_sub(1);

    if good.secondaries < sub_quorum.min(total.secondaries) {
        return false;
    }
    if good.secondaries >= sub_quorum {
        return true;
    }

    let shortfall = sub_quorum - good.secondaries;
    if good.joining < shortfall.min(total.joining) {
        return false;
    }
    if good.secondaries + good.joining >= sub_quorum {
        return true;
    }

    good.secondaries + good.joining + good.arbiters >= sub_quorum
}

/// Decide whether `bad` failures already make the write quorum unreachable.
pub fn check_bad_write_quorum(write_quorum_size: u32, total: RoleCounts, bad: RoleCounts) -> bool {
    !check_write_quorum(write_quorum_size, total, total.remaining_after(bad))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_and_arbiter() {
        // PA with quorum 2: the arbiter alone completes it
        let total = RoleCounts::new(0, 0, 1);
        assert!(check_write_quorum(2, total, RoleCounts::new(0, 0, 1)));
        assert!(!check_write_quorum(2, total, RoleCounts::new(0, 0, 0)));
    }

    #[test]
    fn test_secondaries_before_arbiters() {
        // PSSAA with quorum 3: both secondaries are required while they exist
        let total = RoleCounts::new(2, 0, 2);
        assert!(check_write_quorum(3, total, RoleCounts::new(2, 0, 0)));
        assert!(!check_write_quorum(3, total, RoleCounts::new(1, 0, 2)));
    }

    #[test]
    fn test_joining_fills_shortfall() {
        // PSJAA with quorum 3: one secondary plus the joining secondary
        let total = RoleCounts::new(1, 1, 2);
        assert!(check_write_quorum(3, total, RoleCounts::new(1, 1, 0)));
        assert!(!check_write_quorum(3, total, RoleCounts::new(1, 0, 2)));
    }

    #[test]
    fn test_arbiters_cover_missing_roles() {
        // PSAA with quorum 3: the lone secondary plus one arbiter
        let total = RoleCounts::new(1, 0, 2);
        assert!(check_write_quorum(3, total, RoleCounts::new(1, 0, 1)));
        assert!(!check_write_quorum(3, total, RoleCounts::new(0, 0, 2)));
    }

    #[test]
    fn test_bad_results() {
        let total = RoleCounts::new(2, 0, 2);
        assert!(check_bad_write_quorum(3, total, RoleCounts::new(1, 0, 0)));
        assert!(!check_bad_write_quorum(3, total, RoleCounts::new(0, 0, 2)));
    }

    #[test]
    fn test_remaining_saturates() {
        let total = RoleCounts::new(1, 0, 0);
        assert_eq!(total.remaining_after(RoleCounts::new(3, 1, 1)), RoleCounts::default());
    }
}
