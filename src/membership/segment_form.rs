//! Segment forms
//!
//! A segment form names the role layout of a membership: one letter per
//! member slot (P primary, S secondary, J joining secondary, A arbiter,
//! I inactive secondary), with a `T` prefix for the two-copy layouts of
//! small volumes.
//!
//! Each form answers the quorum questions of an I/O round:
//! - whether a create, commit or read round succeeded
//! - whether a round in flight can still succeed, or must be resent now
//! - whether known disconnections already decide a round
//! - static failover properties of the layout
//!
//! The answers are driven by the per-form records in `form_rules`.

use std::fmt;
use std::str::FromStr;

use super::errors::{MembershipError, MembershipResult};
use super::form_rules::{rules_of, FormRules, Tally};
use super::io_context::IoActionContext;
use super::io_member::SecondariesCountInfo;
use super::segment_membership::SegmentMembership;
use super::volume_type::VolumeType;
use crate::observability::{Event, Logger};

/// Role layout of a segment membership.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SegmentForm {
    PSS,
    PSJ,
    PSI,
    PJI,
    PJJ,
    PII,
    PS,
    PJ,
    PI,
    PSA,
    PJA,
    PIA,
    PA,
    TPS,
    TPJ,
    TPI,
    PSSAA,
    PSSAI,
    PSSII,
    PSJAA,
    PSJAI,
    PSJII,
    PSIAA,
    PSIAI,
    PSIII,
    PJJAA,
    PJJAI,
    PJJII,
    PJIAA,
    PJIAI,
    PJIII,
    PIIAA,
    PIIAI,
    PIIII,
    PSAA,
    PSAI,
    PSII,
    PIAA,
    PIAI,
    PIII,
    PJAA,
    PJAI,
    PJII,
    PAA,
}

impl SegmentForm {
    pub const ALL: [SegmentForm; 44] = [
        SegmentForm::PSS,
        SegmentForm::PSJ,
        SegmentForm::PSI,
        SegmentForm::PJI,
        SegmentForm::PJJ,
        SegmentForm::PII,
        SegmentForm::PS,
        SegmentForm::PJ,
        SegmentForm::PI,
        SegmentForm::PSA,
        SegmentForm::PJA,
        SegmentForm::PIA,
        SegmentForm::PA,
        SegmentForm::TPS,
        SegmentForm::TPJ,
        SegmentForm::TPI,
        SegmentForm::PSSAA,
        SegmentForm::PSSAI,
        SegmentForm::PSSII,
        SegmentForm::PSJAA,
        SegmentForm::PSJAI,
        SegmentForm::PSJII,
        SegmentForm::PSIAA,
        SegmentForm::PSIAI,
        SegmentForm::PSIII,
        SegmentForm::PJJAA,
        SegmentForm::PJJAI,
        SegmentForm::PJJII,
        SegmentForm::PJIAA,
        SegmentForm::PJIAI,
        SegmentForm::PJIII,
        SegmentForm::PIIAA,
        SegmentForm::PIIAI,
        SegmentForm::PIIII,
        SegmentForm::PSAA,
        SegmentForm::PSAI,
        SegmentForm::PSII,
        SegmentForm::PIAA,
        SegmentForm::PIAI,
        SegmentForm::PIII,
        SegmentForm::PJAA,
        SegmentForm::PJAI,
        SegmentForm::PJII,
        SegmentForm::PAA,
    ];

    /// Forms that can be looked up by name: the three-member layouts.
    const NAMED: usize = 16;

    pub fn name(&self) -> &'static str {
        match self {
            SegmentForm::PSS => "PSS",
            SegmentForm::PSJ => "PSJ",
            SegmentForm::PSI => "PSI",
            SegmentForm::PJI => "PJI",
            SegmentForm::PJJ => "PJJ",
            SegmentForm::PII => "PII",
            SegmentForm::PS => "PS",
            SegmentForm::PJ => "PJ",
            SegmentForm::PI => "PI",
            SegmentForm::PSA => "PSA",
            SegmentForm::PJA => "PJA",
            SegmentForm::PIA => "PIA",
            SegmentForm::PA => "PA",
            SegmentForm::TPS => "TPS",
            SegmentForm::TPJ => "TPJ",
            SegmentForm::TPI => "TPI",
            SegmentForm::PSSAA => "PSSAA",
            SegmentForm::PSSAI => "PSSAI",
            SegmentForm::PSSII => "PSSII",
            SegmentForm::PSJAA => "PSJAA",
            SegmentForm::PSJAI => "PSJAI",
            SegmentForm::PSJII => "PSJII",
            SegmentForm::PSIAA => "PSIAA",
            SegmentForm::PSIAI => "PSIAI",
            SegmentForm::PSIII => "PSIII",
            SegmentForm::PJJAA => "PJJAA",
            SegmentForm::PJJAI => "PJJAI",
            SegmentForm::PJJII => "PJJII",
            SegmentForm::PJIAA => "PJIAA",
            SegmentForm::PJIAI => "PJIAI",
            SegmentForm::PJIII => "PJIII",
            SegmentForm::PIIAA => "PIIAA",
            SegmentForm::PIIAI => "PIIAI",
            SegmentForm::PIIII => "PIIII",
            SegmentForm::PSAA => "PSAA",
            SegmentForm::PSAI => "PSAI",
            SegmentForm::PSII => "PSII",
            SegmentForm::PIAA => "PIAA",
            SegmentForm::PIAI => "PIAI",
            SegmentForm::PIII => "PIII",
            SegmentForm::PJAA => "PJAA",
            SegmentForm::PJAI => "PJAI",
            SegmentForm::PJII => "PJII",
            SegmentForm::PAA => "PAA",
        }
    }

    /// Look up a three-member form by its exact name.
    pub fn find_by_name(name: &str) -> MembershipResult<SegmentForm> {
        SegmentForm::ALL[..Self::NAMED]
            .iter()
            .copied()
            .find(|form| form.name() == name)
            .ok_or_else(|| {
                MembershipError::unknown_segment_form(format!("unknown name: {}", name))
            })
    }

    /// Classify a membership by its role counts.
    pub fn get_segment_form(
        membership: &SegmentMembership,
        volume_type: VolumeType,
    ) -> MembershipResult<SegmentForm> {
        volume_type
            .segment_form_for(
                membership.secondaries().len(),
                membership.joining_secondaries().len(),
                membership.arbiters().len(),
                membership.inactive_secondaries().len(),
            )
            .ok_or_else(|| {
                MembershipError::unknown_segment_form(format!(
                    "no {} segment form for {}",
                    volume_type, membership
                ))
            })
    }

    fn rules(&self) -> &'static FormRules {
        rules_of(*self)
    }

    /// Can a create round be declared successful.
    pub fn merge_create_log_result(
        &self,
        good_primary: u32,
        good_secondaries: u32,
        good_joining: u32,
        ctx: &IoActionContext,
        volume_type: VolumeType,
    ) -> bool {
        self.merge_write(good_primary, good_secondaries, good_joining, ctx, volume_type)
    }

    /// Can a commit round be declared successful.
    pub fn merge_commit_log_result(
        &self,
        good_primary: u32,
        good_secondaries: u32,
        good_joining: u32,
        ctx: &IoActionContext,
        volume_type: VolumeType,
    ) -> bool {
        self.merge_write(good_primary, good_secondaries, good_joining, ctx, volume_type)
    }

    fn merge_write(
        &self,
        good_primary: u32,
        good_secondaries: u32,
        good_joining: u32,
        ctx: &IoActionContext,
        volume_type: VolumeType,
    ) -> bool {
        let tally = Tally::new(volume_type.write_quorum_size())
            .counts(good_primary, good_secondaries, good_joining, 0)
            .observe(ctx);
        let success = self.rules().write_merge.holds(&tally);

        if Self::refused_without_primary(success, &tally) {
            Logger::error(
                Event::WriteRefused.as_str(),
                &[
                    ("form", self.name()),
                    ("request_id", &ctx.request_id().to_string()),
                    ("reason", "primary down, remaining members cannot take the write"),
                ],
            );
        }
        success
    }

    /// A create or commit was refused while no primary answered the round.
    fn refused_without_primary(success: bool, tally: &Tally) -> bool {
        !success && tally.primary_down
    }

    /// Can a read round be declared successful.
    ///
    /// Secondaries are counted in full; the fetch count tells whether one
    /// of them actually returned data.
    pub fn merge_read_log_result(
        &self,
        good_primary: u32,
        secondaries: SecondariesCountInfo,
        good_joining: u32,
        good_arbiters: u32,
        ctx: &IoActionContext,
        volume_type: VolumeType,
    ) -> bool {
        let tally = Tally::new(volume_type.write_quorum_size())
            .counts(
                good_primary,
                secondaries.all_secondaries_count(),
                good_joining,
                good_arbiters,
            )
            .fetched(secondaries.fetch_count())
            .observe(ctx);
        self.rules().read_merge.holds(&tally)
    }

    /// Look at the members still alive during a write and ask for an
    /// immediate resend once the quorum is out of reach.
    pub fn process_write_io_action_context(
        &self,
        primary: u32,
        secondaries: u32,
        joining: u32,
        ctx: &mut IoActionContext,
        volume_type: VolumeType,
    ) {
        let tally = Tally::new(volume_type.write_quorum_size())
            .counts(primary, secondaries, joining, 0)
            .observe(ctx);
        if self.rules().write_resend.holds(&tally) {
            self.resend(ctx, "write", &tally);
        }
    }

    /// Read counterpart of `process_write_io_action_context`.
    ///
    /// Layouts where the primary alone is authoritative drop their check
    /// readers once the primary is known to be alive.
    pub fn process_read_io_action_context(
        &self,
        primary: u32,
        secondaries: u32,
        joining: u32,
        arbiters: u32,
        ctx: &mut IoActionContext,
        volume_type: VolumeType,
    ) {
        let rules = self.rules();
        let tally = Tally::new(volume_type.write_quorum_size())
            .counts(primary, secondaries, joining, arbiters)
            .observe(ctx);
        if rules.read_resend.holds(&tally) {
            self.resend(ctx, "read", &tally);
        } else if rules.trim_check_reads {
            ctx.do_not_need_check_read();
        }
    }

    fn resend(&self, ctx: &mut IoActionContext, io: &str, tally: &Tally) {
        ctx.set_resend_directly(true);
        Logger::trace(
            Event::ResendDecided.as_str(),
            &[
                ("form", self.name()),
                ("io", io),
                ("request_id", &ctx.request_id().to_string()),
                (
                    "alive",
                    &format!(
                        "p={} s={} j={} a={}",
                        tally.primary, tally.secondary, tally.joining, tally.arbiter
                    ),
                ),
            ],
        );
    }

    /// Whether a write with the given alive counts would go ahead.
    pub fn writable(
        &self,
        primary: u32,
        secondaries: u32,
        joining: u32,
        volume_type: VolumeType,
    ) -> bool {
        let mut ctx = IoActionContext::new();
        self.process_write_io_action_context(primary, secondaries, joining, &mut ctx, volume_type);
        !ctx.is_resend_directly()
    }

    /// Disconnections known before a write already decide it.
    pub fn write_done_directly(
        &self,
        primary_disconnect: u32,
        secondary_disconnect: u32,
        joining_disconnect: u32,
        arbiter_disconnect: u32,
        volume_type: VolumeType,
    ) -> bool {
        let tally = Tally::new(volume_type.write_quorum_size()).counts(
            primary_disconnect,
            secondary_disconnect,
            joining_disconnect,
            arbiter_disconnect,
        );
        self.rules().write_done.holds(&tally)
    }

    /// Disconnections known before a read already decide it.
    pub fn read_done_directly(
        &self,
        primary_disconnect: u32,
        secondary_disconnect: u32,
        joining_disconnect: u32,
        arbiter_disconnect: u32,
        volume_type: VolumeType,
    ) -> bool {
        let tally = Tally::new(volume_type.write_quorum_size()).counts(
            primary_disconnect,
            secondary_disconnect,
            joining_disconnect,
            arbiter_disconnect,
        );
        self.rules().read_done.holds(&tally)
    }

    pub fn is_skip_from_source_volume_data(&self, skipped_secondaries: u32) -> bool {
        skipped_secondaries >= self.rules().skip_threshold
    }

    /// Enough secondaries remain to elect a new primary if this one is lost.
    pub fn can_generate_new_primary(&self) -> bool {
        self.rules().can_generate_new_primary
    }

    /// Reads may only be served by the primary.
    pub fn only_primary(&self) -> bool {
        self.rules().only_primary
    }

    /// A member may become primary while one secondary is unreachable to it.
    ///
    /// False where the unreachable secondary, once marked inactive, could no
    /// longer take part in electing the next primary (PSA, PSSAA).
    pub fn safe_to_become_primary_with_a_secondary_missing(&self) -> bool {
        self.rules().safe_with_secondary_missing
    }
}

impl fmt::Display for SegmentForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for SegmentForm {
    type Err = MembershipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SegmentForm::ALL
            .iter()
            .copied()
            .find(|form| form.name() == s)
            .ok_or_else(|| MembershipError::unknown_segment_form(format!("unknown name: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::membership::instance::{EndPoint, InstanceId};
    use crate::membership::io_member::{IoMember, ReadCause};
    use crate::membership::member_io_status::MemberIoStatus;

    fn member(id: u64, status: MemberIoStatus) -> IoMember {
        IoMember::new(InstanceId::new(id), EndPoint::new("10.0.0.2", 8000 + id as u16), status)
    }

    fn ctx_with(statuses: &[(u64, MemberIoStatus)]) -> IoActionContext {
        let mut ctx = IoActionContext::new();
        for (id, status) in statuses {
            ctx.add_io_member(member(*id, *status));
        }
        ctx
    }

    #[test]
    fn test_refused_write_without_primary_is_flagged_for_every_form() {
        let forms = [
            (SegmentForm::PSI, VolumeType::Regular),
            (SegmentForm::PJJ, VolumeType::Regular),
            (SegmentForm::PJI, VolumeType::Regular),
            (SegmentForm::PS, VolumeType::Regular),
            (SegmentForm::PJ, VolumeType::Regular),
            (SegmentForm::PSS, VolumeType::Regular),
            (SegmentForm::PA, VolumeType::Small),
            (SegmentForm::PSJAA, VolumeType::Large),
        ];

        for (form, volume_type) in forms {
            let mut down = ctx_with(&[(2, MemberIoStatus::Secondary)]);
            down.set_total_write_count(3);
            let tally = Tally::new(volume_type.write_quorum_size()).observe(&down);
            let success = form.merge_create_log_result(0, 0, 0, &down, volume_type);
            assert!(!success, "{}", form);
            assert!(SegmentForm::refused_without_primary(success, &tally), "{}", form);

            let mut up = ctx_with(&[(1, MemberIoStatus::Primary)]);
            up.set_total_write_count(3);
            let tally = Tally::new(volume_type.write_quorum_size()).observe(&up);
            let success = form.merge_commit_log_result(0, 0, 0, &up, volume_type);
            assert!(!success, "{}", form);
            assert!(!SegmentForm::refused_without_primary(success, &tally), "{}", form);
        }
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<_> = SegmentForm::ALL.iter().map(|f| f.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 44);
    }

    #[test]
    fn test_find_by_name_only_three_member_forms() {
        assert_eq!(SegmentForm::find_by_name("PSS").unwrap(), SegmentForm::PSS);
        assert_eq!(SegmentForm::find_by_name("TPI").unwrap(), SegmentForm::TPI);
        let err = SegmentForm::find_by_name("PSSAA").unwrap_err();
        assert!(err.is_fatal());
        assert!(SegmentForm::find_by_name("pss").is_err());
        assert_eq!("PSSAA".parse::<SegmentForm>().unwrap(), SegmentForm::PSSAA);
    }

    #[test]
    fn test_pss_create() {
        let vt = VolumeType::Regular;
        let alive = ctx_with(&[(1, MemberIoStatus::Primary), (2, MemberIoStatus::Secondary)]);
        assert!(SegmentForm::PSS.merge_create_log_result(1, 1, 0, &alive, vt));
        assert!(!SegmentForm::PSS.merge_create_log_result(1, 0, 0, &alive, vt));

        let primary_down = ctx_with(&[(2, MemberIoStatus::Secondary), (3, MemberIoStatus::Secondary)]);
        assert!(!SegmentForm::PSS.merge_create_log_result(0, 1, 0, &primary_down, vt));
        assert!(SegmentForm::PSS.merge_commit_log_result(0, 2, 0, &primary_down, vt));
    }

    #[test]
    fn test_default_create_needs_every_writer() {
        let vt = VolumeType::Large;
        let mut ctx = ctx_with(&[(1, MemberIoStatus::Primary)]);
        ctx.set_total_write_count(3);
        assert!(SegmentForm::PSSAA.merge_create_log_result(1, 2, 0, &ctx, vt));
        assert!(!SegmentForm::PSSAA.merge_create_log_result(1, 1, 0, &ctx, vt));
    }

    #[test]
    fn test_pss_read_needs_fetch_when_primary_down() {
        let vt = VolumeType::Regular;
        let ctx = ctx_with(&[(2, MemberIoStatus::Secondary), (3, MemberIoStatus::Secondary)]);
        assert!(!SegmentForm::PSS.merge_read_log_result(0, SecondariesCountInfo::new(0, 2), 0, 0, &ctx, vt));
        assert!(SegmentForm::PSS.merge_read_log_result(0, SecondariesCountInfo::new(1, 1), 0, 0, &ctx, vt));

        let mut read_down = ctx_with(&[(2, MemberIoStatus::SecondaryReadDown)]);
        read_down.set_met_read_down_secondary(true);
        assert!(SegmentForm::PSS.merge_read_log_result(0, SecondariesCountInfo::new(0, 1), 0, 0, &read_down, vt));
    }

    #[test]
    fn test_pa_reads_follow_primary_only() {
        let vt = VolumeType::Small;
        let alive = ctx_with(&[(1, MemberIoStatus::Primary)]);
        let down = ctx_with(&[(3, MemberIoStatus::Arbiter)]);
        for arbiters in 0..2 {
            assert!(SegmentForm::PA.merge_read_log_result(1, SecondariesCountInfo::default(), 0, arbiters, &alive, vt));
            assert!(!SegmentForm::PA.merge_read_log_result(0, SecondariesCountInfo::default(), 0, arbiters, &down, vt));
        }

        let mut ctx = ctx_with(&[(1, MemberIoStatus::Primary)]);
        SegmentForm::PA.process_read_io_action_context(1, 0, 0, 0, &mut ctx, vt);
        assert!(!ctx.is_resend_directly());
        SegmentForm::PA.process_write_io_action_context(1, 0, 0, &mut ctx, vt);
        assert!(!ctx.is_resend_directly());
        assert!(SegmentForm::PA.only_primary());
    }

    #[test]
    fn test_process_write_sets_resend() {
        let vt = VolumeType::Regular;
        let mut ctx = IoActionContext::new();
        SegmentForm::PSS.process_write_io_action_context(1, 1, 0, &mut ctx, vt);
        assert!(!ctx.is_resend_directly());
        SegmentForm::PSS.process_write_io_action_context(0, 1, 0, &mut ctx, vt);
        assert!(ctx.is_resend_directly());
    }

    #[test]
    fn test_read_trims_check_readers() {
        let vt = VolumeType::Regular;
        let mut ctx = IoActionContext::new();
        ctx.add_io_member(member(1, MemberIoStatus::Primary).with_read_cause(ReadCause::Fetch));
        ctx.add_io_member(member(2, MemberIoStatus::Secondary).with_read_cause(ReadCause::Check));
        SegmentForm::PS.process_read_io_action_context(1, 1, 0, 0, &mut ctx, vt);
        assert!(!ctx.is_resend_directly());
        assert!(ctx.check_readers().is_empty());

        let mut kept = IoActionContext::new();
        kept.add_io_member(member(1, MemberIoStatus::Primary).with_read_cause(ReadCause::Fetch));
        kept.add_io_member(member(2, MemberIoStatus::Secondary).with_read_cause(ReadCause::Check));
        SegmentForm::PSS.process_read_io_action_context(1, 1, 0, 0, &mut kept, vt);
        assert_eq!(kept.check_readers().len(), 1);
    }

    #[test]
    fn test_writable() {
        assert!(SegmentForm::PSS.writable(1, 1, 0, VolumeType::Regular));
        assert!(!SegmentForm::PSS.writable(1, 0, 0, VolumeType::Regular));
        assert!(!SegmentForm::PJJ.writable(1, 0, 2, VolumeType::Regular));
        assert!(!SegmentForm::PSIII.writable(1, 1, 0, VolumeType::Large));
    }

    #[test]
    fn test_done_directly() {
        let vt = VolumeType::Regular;
        assert!(SegmentForm::PSS.write_done_directly(1, 1, 0, 0, vt));
        assert!(!SegmentForm::PSS.write_done_directly(0, 1, 0, 0, vt));
        assert!(SegmentForm::PJJ.write_done_directly(0, 0, 0, 0, vt));
        assert!(!SegmentForm::PSIII.read_done_directly(1, 1, 0, 0, VolumeType::Large));
    }

    #[test]
    fn test_static_flags() {
        assert!(SegmentForm::PSS.can_generate_new_primary());
        assert!(!SegmentForm::PS.can_generate_new_primary());
        assert!(!SegmentForm::PSA.safe_to_become_primary_with_a_secondary_missing());
        assert!(!SegmentForm::PSSAA.safe_to_become_primary_with_a_secondary_missing());
        assert!(SegmentForm::PSSAI.safe_to_become_primary_with_a_secondary_missing());
        assert!(SegmentForm::PIIAA.only_primary());
        assert!(!SegmentForm::PSJ.only_primary());
    }

    #[test]
    fn test_skip_from_source_volume_data() {
        assert!(!SegmentForm::PSS.is_skip_from_source_volume_data(1));
        assert!(SegmentForm::PSS.is_skip_from_source_volume_data(2));
        assert!(SegmentForm::PS.is_skip_from_source_volume_data(1));
        assert!(!SegmentForm::PS.is_skip_from_source_volume_data(0));
    }
}
