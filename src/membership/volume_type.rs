//! Volume types and their topology tables
//!
//! A volume type fixes how many members a segment has, how many of them
//! are secondaries (the rest besides the primary are arbiters) and the
//! write/voting quorum sizes. It also knows which role-count combinations
//! are legal for it and which segment form each one maps to.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::{MembershipError, MembershipResult};
use super::segment_form::SegmentForm;

/// Member layout and quorum sizes of a volume type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeShape {
    num_members: u32,
    num_secondaries: u32,
    write_quorum_size: u32,
    voting_quorum_size: u32,
}

impl VolumeShape {
    /// Validate and build a shape.
    ///
    /// The primary plus the secondaries must fit in the member count, and
    /// the write quorum can never be smaller than the voting quorum.
    pub fn new(
        num_members: u32,
        num_secondaries: u32,
        write_quorum_size: u32,
        voting_quorum_size: u32,
    ) -> MembershipResult<Self> {
        if num_secondaries + 1 > num_members {
            return Err(MembershipError::configuration_error(format!(
                "{} secondaries do not fit in {} members",
                num_secondaries, num_members
            )));
        }
        if write_quorum_size < voting_quorum_size {
            return Err(MembershipError::configuration_error(format!(
                "write quorum {} is less than voting quorum {}",
                write_quorum_size, voting_quorum_size
            )));
        }
        Ok(Self::unchecked(
            num_members,
            num_secondaries,
            write_quorum_size,
            voting_quorum_size,
        ))
    }

    const fn unchecked(
        num_members: u32,
        num_secondaries: u32,
        write_quorum_size: u32,
        voting_quorum_size: u32,
    ) -> Self {
        Self {
            num_members,
            num_secondaries,
            write_quorum_size,
            voting_quorum_size,
        }
    }

    pub fn num_members(&self) -> u32 {
        self.num_members
    }

    pub fn num_secondaries(&self) -> u32 {
        self.num_secondaries
    }

    pub fn num_arbiters(&self) -> u32 {
        self.num_members - self.num_secondaries - 1
    }

    pub fn write_quorum_size(&self) -> u32 {
        self.write_quorum_size
    }

    pub fn voting_quorum_size(&self) -> u32 {
        self.voting_quorum_size
    }
}

/// Supported volume types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VolumeType {
    /// Primary and two secondaries
    #[default]
    Regular,
    /// Primary, one secondary and one arbiter
    Small,
    /// Primary, two secondaries and two arbiters
    Large,
}

impl VolumeType {
    pub const ALL: [VolumeType; 3] = [VolumeType::Regular, VolumeType::Small, VolumeType::Large];

    pub fn shape(&self) -> VolumeShape {
        match self {
            VolumeType::Regular => VolumeShape::unchecked(3, 2, 2, 2),
            VolumeType::Small => VolumeShape::unchecked(3, 1, 2, 2),
            VolumeType::Large => VolumeShape::unchecked(5, 2, 3, 3),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            VolumeType::Regular => "REGULAR",
            VolumeType::Small => "SMALL",
            VolumeType::Large => "LARGE",
        }
    }

    pub fn num_members(&self) -> u32 {
        self.shape().num_members()
    }

    pub fn num_secondaries(&self) -> u32 {
        self.shape().num_secondaries()
    }

    pub fn num_arbiters(&self) -> u32 {
        self.shape().num_arbiters()
    }

    pub fn write_quorum_size(&self) -> u32 {
        self.shape().write_quorum_size()
    }

    pub fn voting_quorum_size(&self) -> u32 {
        self.shape().voting_quorum_size()
    }

    /// Classify role counts into a segment form.
    ///
    /// Inactive secondaries only count up to the slots the alive roles
    /// leave free. Combinations the volume type cannot hold yield `None`.
    pub fn segment_form_for(
        &self,
        secondaries: usize,
        joining: usize,
        arbiters: usize,
        inactive: usize,
    ) -> Option<SegmentForm> {
        use SegmentForm::*;

        let slots = self.num_members() as usize - 1;
        let alive = secondaries + joining + arbiters;
        if alive > slots {
            return None;
        }
        let inactive = inactive.min(slots - alive);

        match self {
            VolumeType::Regular => {
                if arbiters != 0 {
                    return None;
                }
                match (secondaries, joining, inactive) {
                    (2, 0, 0) => Some(PSS),
                    (1, 1, 0) => Some(PSJ),
                    (1, 0, 1) => Some(PSI),
                    (1, 0, 0) => Some(PS),
                    (0, 2, 0) => Some(PJJ),
                    (0, 1, 1) => Some(PJI),
                    (0, 1, 0) => Some(PJ),
                    (0, 0, 2) => Some(PII),
                    (0, 0, 1) => Some(PI),
                    _ => None,
                }
            }
            VolumeType::Small => match (secondaries, joining, arbiters, inactive) {
                (1, 0, 1, 0) => Some(PSA),
                (1, 0, 0, _) => Some(TPS),
                (0, 1, 1, 0) => Some(PJA),
                (0, 1, 0, _) => Some(TPJ),
                (0, 0, 1, 1) => Some(PIA),
                (0, 0, 1, 0) => Some(PA),
                (0, 0, 0, 1) | (0, 0, 0, 2) => Some(TPI),
                _ => None,
            },
            VolumeType::Large => match (secondaries, joining, arbiters, inactive) {
                (2, 0, 2, 0) => Some(PSSAA),
                (2, 0, 1, 1) => Some(PSSAI),
                (2, 0, 0, 2) => Some(PSSII),
                (1, 1, 2, 0) => Some(PSJAA),
                (1, 1, 1, 1) => Some(PSJAI),
                (1, 1, 0, 2) => Some(PSJII),
                (1, 0, 2, 1) => Some(PSIAA),
                (1, 0, 1, 2) => Some(PSIAI),
                (1, 0, 0, 3) => Some(PSIII),
                (0, 2, 2, 0) => Some(PJJAA),
                (0, 2, 1, 1) => Some(PJJAI),
                (0, 2, 0, 2) => Some(PJJII),
                (0, 1, 2, 1) => Some(PJIAA),
                (0, 1, 1, 2) => Some(PJIAI),
                (0, 1, 0, 3) => Some(PJIII),
                (0, 0, 2, 2) => Some(PIIAA),
                (0, 0, 1, 3) => Some(PIIAI),
                (0, 0, 0, 4) => Some(PIIII),
                (1, 0, 2, 0) => Some(PSAA),
                (1, 0, 1, 1) => Some(PSAI),
                (1, 0, 0, 2) => Some(PSII),
                (0, 0, 2, 1) => Some(PIAA),
                (0, 0, 1, 2) => Some(PIAI),
                (0, 0, 0, 3) => Some(PIII),
                (0, 1, 2, 0) => Some(PJAA),
                (0, 1, 1, 1) => Some(PJAI),
                (0, 1, 0, 2) => Some(PJII),
                (0, 0, 2, 0) => Some(PAA),
                _ => None,
            },
        }
    }
}

impl fmt::Display for VolumeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for VolumeType {
    type Err = MembershipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VolumeType::ALL
            .iter()
            .copied()
            .find(|vt| vt.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| MembershipError::configuration_error(format!("unknown volume type {:?}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shapes() {
        assert_eq!(VolumeType::Regular.num_arbiters(), 0);
        assert_eq!(VolumeType::Small.num_arbiters(), 1);
        assert_eq!(VolumeType::Large.num_arbiters(), 2);
        assert_eq!(VolumeType::Large.write_quorum_size(), 3);
        assert_eq!(VolumeType::Small.voting_quorum_size(), 2);
    }

    #[test]
    fn test_shape_validation() {
        assert!(VolumeShape::new(3, 2, 2, 2).is_ok());
        assert!(VolumeShape::new(3, 3, 2, 2).is_err());
        assert!(VolumeShape::new(5, 2, 2, 3).is_err());
        for vt in VolumeType::ALL {
            let s = vt.shape();
            assert!(VolumeShape::new(
                s.num_members(),
                s.num_secondaries(),
                s.write_quorum_size(),
                s.voting_quorum_size()
            )
            .is_ok());
        }
    }

    #[test]
    fn test_regular_forms() {
        let vt = VolumeType::Regular;
        assert_eq!(vt.segment_form_for(2, 0, 0, 0), Some(SegmentForm::PSS));
        assert_eq!(vt.segment_form_for(1, 1, 0, 0), Some(SegmentForm::PSJ));
        assert_eq!(vt.segment_form_for(1, 0, 0, 5), Some(SegmentForm::PSI));
        assert_eq!(vt.segment_form_for(0, 0, 0, 0), None);
        assert_eq!(vt.segment_form_for(1, 0, 1, 0), None);
        assert_eq!(vt.segment_form_for(2, 1, 0, 0), None);
    }

    #[test]
    fn test_small_forms() {
        let vt = VolumeType::Small;
        assert_eq!(vt.segment_form_for(1, 0, 1, 0), Some(SegmentForm::PSA));
        assert_eq!(vt.segment_form_for(1, 0, 0, 1), Some(SegmentForm::TPS));
        assert_eq!(vt.segment_form_for(0, 0, 1, 0), Some(SegmentForm::PA));
        assert_eq!(vt.segment_form_for(0, 0, 0, 2), Some(SegmentForm::TPI));
        assert_eq!(vt.segment_form_for(0, 1, 0, 1), Some(SegmentForm::TPJ));
    }

    #[test]
    fn test_large_caps_inactive() {
        let vt = VolumeType::Large;
        assert_eq!(vt.segment_form_for(2, 0, 2, 3), Some(SegmentForm::PSSAA));
        assert_eq!(vt.segment_form_for(1, 1, 1, 9), Some(SegmentForm::PSJAI));
        assert_eq!(vt.segment_form_for(0, 0, 0, 4), Some(SegmentForm::PIIII));
        assert_eq!(vt.segment_form_for(0, 0, 0, 3), Some(SegmentForm::PIII));
        assert_eq!(vt.segment_form_for(2, 1, 0, 0), None);
        assert_eq!(vt.segment_form_for(2, 0, 3, 0), None);
    }

    #[test]
    fn test_parse_and_serde() {
        assert_eq!("small".parse::<VolumeType>().unwrap(), VolumeType::Small);
        assert!("HUGE".parse::<VolumeType>().is_err());
        let json = serde_json::to_string(&VolumeType::Large).unwrap();
        assert_eq!(json, "\"LARGE\"");
        let back: VolumeType = serde_json::from_str("\"REGULAR\"").unwrap();
        assert_eq!(back, VolumeType::Regular);
    }
}
