//! Per-round I/O aggregation context
//!
//! An `IoActionContext` is created by the coordinator for one broadcast
//! round, filled with the members it will contact, handed to the segment
//! form for the resend decision, and dropped once the verdict is produced.
//! It is owned by a single task and never shared.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use super::errors::{MembershipError, MembershipResult};
use super::instance::InstanceId;
use super::io_member::IoMember;
use super::segment_form::SegmentForm;
use super::segment_membership::SegmentMembership;

/// Aggregated state of one I/O round.
#[derive(Debug)]
pub struct IoActionContext {
    request_id: Uuid,
    /// Never holds a member whose status is down.
    io_members: HashSet<IoMember>,
    segment_form: Option<SegmentForm>,
    zombie_request: bool,
    unstable_primary_write: bool,
    resend_directly: bool,
    membership_when_io_came: Option<Arc<SegmentMembership>>,
    met_read_down_secondary: bool,
    total_write_count: u32,
    net_unhealthy_instance_ids: HashSet<InstanceId>,
}

impl Default for IoActionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl IoActionContext {
    /// Fresh context with a new request id.
    pub fn new() -> Self {
        Self::with_request_id(Uuid::new_v4())
    }

    /// Fresh context correlated with an existing request.
    pub fn with_request_id(request_id: Uuid) -> Self {
        Self {
            request_id,
            io_members: HashSet::new(),
            segment_form: None,
            zombie_request: false,
            unstable_primary_write: false,
            resend_directly: false,
            membership_when_io_came: None,
            met_read_down_secondary: false,
            total_write_count: 0,
            net_unhealthy_instance_ids: HashSet::new(),
        }
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Add a member to contact. Down members are ignored.
    ///
    /// Returns whether the member was added.
    pub fn add_io_member(&mut self, member: IoMember) -> bool {
        if member.member_io_status().is_down() {
            return false;
        }
        self.io_members.insert(member)
    }

    pub fn io_members(&self) -> &HashSet<IoMember> {
        &self.io_members
    }

    /// Members that actually return data (everyone but check readers).
    pub fn real_readers(&self) -> MembershipResult<Vec<&IoMember>> {
        let readers: Vec<&IoMember> = self
            .io_members
            .iter()
            .filter(|m| !m.is_check_read())
            .collect();
        if readers.is_empty() {
            return Err(MembershipError::invariant_violation(format!(
                "read round {} has no real reader",
                self.request_id
            )));
        }
        Ok(readers)
    }

    /// The single fetch reader, if any.
    pub fn fetch_reader(&self) -> MembershipResult<Option<&IoMember>> {
        let mut fetchers = self.io_members.iter().filter(|m| m.is_fetch_read());
        let first = fetchers.next();
        if fetchers.next().is_some() {
            return Err(MembershipError::invariant_violation(format!(
                "read round {} has more than one fetch reader",
                self.request_id
            )));
        }
        Ok(first)
    }

    pub fn check_readers(&self) -> Vec<&IoMember> {
        self.io_members.iter().filter(|m| m.is_check_read()).collect()
    }

    /// Drop every check reader; the primary alone confirms the read.
    pub fn do_not_need_check_read(&mut self) {
        self.io_members.retain(|m| !m.is_check_read());
    }

    /// No member in the round reports a primary-family status.
    pub fn is_primary_down(&self) -> bool {
        !self
            .io_members
            .iter()
            .any(|m| m.member_io_status().is_primary())
    }

    /// No member in the round reports a secondary-family status.
    pub fn is_secondary_down(&self) -> bool {
        !self
            .io_members
            .iter()
            .any(|m| m.member_io_status().is_secondary())
    }

    pub fn is_joining_secondary_down(&self) -> bool {
        !self
            .io_members
            .iter()
            .any(|m| m.member_io_status().is_joining_secondary())
    }

    pub fn got_temp_primary(&self) -> bool {
        self.io_members
            .iter()
            .any(|m| m.member_io_status().is_temp_primary())
    }

    pub fn segment_form(&self) -> Option<SegmentForm> {
        self.segment_form
    }

    pub fn set_segment_form(&mut self, form: SegmentForm) {
        self.segment_form = Some(form);
    }

    pub fn is_zombie_request(&self) -> bool {
        self.zombie_request
    }

    pub fn set_zombie_request(&mut self, zombie: bool) {
        self.zombie_request = zombie;
    }

    pub fn is_unstable_primary_write(&self) -> bool {
        self.unstable_primary_write
    }

    pub fn set_unstable_primary_write(&mut self, unstable: bool) {
        self.unstable_primary_write = unstable;
    }

    pub fn is_resend_directly(&self) -> bool {
        self.resend_directly
    }

    pub fn set_resend_directly(&mut self, resend: bool) {
        self.resend_directly = resend;
    }

    pub fn membership_when_io_came(&self) -> Option<&Arc<SegmentMembership>> {
        self.membership_when_io_came.as_ref()
    }

    pub fn set_membership_when_io_came(&mut self, membership: Arc<SegmentMembership>) {
        self.membership_when_io_came = Some(membership);
    }

    pub fn is_met_read_down_secondary(&self) -> bool {
        self.met_read_down_secondary
    }

    pub fn set_met_read_down_secondary(&mut self, met: bool) {
        self.met_read_down_secondary = met;
    }

    pub fn total_write_count(&self) -> u32 {
        self.total_write_count
    }

    pub fn set_total_write_count(&mut self, count: u32) {
        self.total_write_count = count;
    }

    pub fn net_unhealthy_instance_ids(&self) -> &HashSet<InstanceId> {
        &self.net_unhealthy_instance_ids
    }

    pub fn add_unhealthy_instance_id(&mut self, id: InstanceId) {
        self.net_unhealthy_instance_ids.insert(id);
    }
}

impl fmt::Display for IoActionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IoActionContext{{request={}, members={}, form={:?}, zombie={}, unstablePrimaryWrite={}, resendDirectly={}, metReadDownSecondary={}}}",
            self.request_id,
            self.io_members.len(),
            self.segment_form,
            self.zombie_request,
            self.unstable_primary_write,
            self.resend_directly,
            self.met_read_down_secondary
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::membership::instance::EndPoint;
    use crate::membership::io_member::ReadCause;
    use crate::membership::member_io_status::MemberIoStatus;

    fn member(id: u64, status: MemberIoStatus) -> IoMember {
        IoMember::new(InstanceId::new(id), EndPoint::new("127.0.0.1", 7000 + id as u16), status)
    }

    #[test]
    fn test_down_members_are_not_added() {
        let mut ctx = IoActionContext::new();
        assert!(ctx.add_io_member(member(1, MemberIoStatus::Primary)));
        assert!(!ctx.add_io_member(member(2, MemberIoStatus::SecondaryDown)));
        assert!(!ctx.add_io_member(member(3, MemberIoStatus::InactiveSecondary)));
        // read-down secondaries still take part in writes
        assert!(ctx.add_io_member(member(4, MemberIoStatus::SecondaryReadDown)));
        assert_eq!(ctx.io_members().len(), 2);
    }

    #[test]
    fn test_primary_down_detection() {
        let mut ctx = IoActionContext::new();
        ctx.add_io_member(member(2, MemberIoStatus::Secondary));
        ctx.add_io_member(member(3, MemberIoStatus::TempPrimary));
        assert!(ctx.is_primary_down());
        assert!(!ctx.is_secondary_down());
        assert!(ctx.is_joining_secondary_down());
        assert!(ctx.got_temp_primary());

        ctx.add_io_member(member(1, MemberIoStatus::UnstablePrimary));
        assert!(!ctx.is_primary_down());
    }

    #[test]
    fn test_readers() {
        let mut ctx = IoActionContext::new();
        ctx.add_io_member(member(1, MemberIoStatus::Primary).with_read_cause(ReadCause::Fetch));
        ctx.add_io_member(member(2, MemberIoStatus::Secondary).with_read_cause(ReadCause::Check));
        ctx.add_io_member(member(3, MemberIoStatus::Secondary).with_read_cause(ReadCause::Check));

        assert_eq!(ctx.real_readers().unwrap().len(), 1);
        assert_eq!(ctx.check_readers().len(), 2);
        assert_eq!(
            ctx.fetch_reader().unwrap().map(|m| m.instance_id()),
            Some(InstanceId::new(1))
        );

        ctx.do_not_need_check_read();
        assert!(ctx.check_readers().is_empty());
        assert_eq!(ctx.io_members().len(), 1);
    }

    #[test]
    fn test_reader_invariants() {
        let mut only_checks = IoActionContext::new();
        only_checks.add_io_member(member(2, MemberIoStatus::Secondary).with_read_cause(ReadCause::Check));
        assert!(only_checks.real_readers().unwrap_err().is_fatal());

        let mut two_fetchers = IoActionContext::new();
        two_fetchers.add_io_member(member(1, MemberIoStatus::Primary).with_read_cause(ReadCause::Fetch));
        two_fetchers.add_io_member(member(2, MemberIoStatus::Secondary).with_read_cause(ReadCause::Fetch));
        assert!(two_fetchers.fetch_reader().is_err());
    }

    #[test]
    fn test_unhealthy_ids() {
        let mut ctx = IoActionContext::new();
        ctx.add_unhealthy_instance_id(InstanceId::new(5));
        ctx.add_unhealthy_instance_id(InstanceId::new(5));
        assert_eq!(ctx.net_unhealthy_instance_ids().len(), 1);
    }
}
