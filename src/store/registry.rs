//! Per-segment membership registry
//!
//! Holds the installed membership of every segment and serializes
//! installs against transitions behind one lock:
//! - a membership is only replaced by a strictly higher version
//! - a higher membership must pass `SegmentMembershipHelper`
//! - every accepted membership is persisted before it becomes visible

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::membership::{
    InstanceId, IoActionContext, MemberIoStatus, MembershipResult, SegmentForm,
    SegmentMembership, SegmentMembershipHelper, VolumeType,
};
use crate::observability::{Event, Logger, MembershipMetrics};

use super::errors::{StoreError, StoreResult};
use super::sink::MembershipSink;

pub struct MembershipRegistry {
    installed: Mutex<HashMap<u64, Arc<SegmentMembership>>>,
    sink: Box<dyn MembershipSink>,
    metrics: MembershipMetrics,
}

impl MembershipRegistry {
    pub fn new(sink: Box<dyn MembershipSink>) -> Self {
        Self {
            installed: Mutex::new(HashMap::new()),
            sink,
            metrics: MembershipMetrics::new(),
        }
    }

    pub fn metrics(&self) -> &MembershipMetrics {
        &self.metrics
    }

    pub fn sink(&self) -> &dyn MembershipSink {
        self.sink.as_ref()
    }

    /// Currently installed membership of `segment`.
    pub fn get(&self, segment: u64) -> Option<Arc<SegmentMembership>> {
        self.installed.lock().unwrap().get(&segment).cloned()
    }

    /// Reload `segment` from the sink, replacing whatever is installed.
    pub fn recover(&self, segment: u64) -> StoreResult<Option<Arc<SegmentMembership>>> {
        let mut installed = self.installed.lock().unwrap();
        match self.sink.load_latest(segment)? {
            Some(membership) => {
                let membership = Arc::new(membership);
                installed.insert(segment, Arc::clone(&membership));
                Ok(Some(membership))
            }
            None => Ok(None),
        }
    }

    /// Install `membership` for `segment` as seen by `myself`.
    ///
    /// Returns whether it was installed. Equal or lower versions and
    /// memberships refused by the helper leave the registry unchanged; an
    /// equal version with different content is a fatal error.
    pub fn install(
        &self,
        segment: u64,
        membership: SegmentMembership,
        myself: InstanceId,
        total_members: usize,
    ) -> StoreResult<bool> {
        let mut installed = self.installed.lock().unwrap();

        if let Some(current) = installed.get(&segment) {
            let refused = match membership.compare_to(current)? {
                Ordering::Greater => {
                    if SegmentMembershipHelper::ok_to_update_to_higher_membership(
                        &membership,
                        current,
                        myself,
                        total_members,
                    )? {
                        None
                    } else {
                        Some("helper refused higher membership")
                    }
                }
                Ordering::Equal => Some("already installed"),
                Ordering::Less => Some("lower version"),
            };

            if let Some(reason) = refused {
                self.metrics.increment_installs_refused();
                Logger::warn(
                    Event::InstallRefused.as_str(),
                    &[
                        ("segment", &segment.to_string()),
                        ("current", &current.version().to_string()),
                        ("offered", &membership.version().to_string()),
                        ("reason", reason),
                    ],
                );
                return Ok(false);
            }
        }

        self.commit(&mut installed, segment, membership)?;
        self.metrics.increment_installs_accepted();
        Ok(true)
    }

    /// Run a transition against the installed membership of `segment` and
    /// install its result.
    ///
    /// `transition` yields `None` (or an unchanged version) when it does
    /// not apply; the installed membership then stays and `None` is
    /// returned.
    pub fn apply<F>(
        &self,
        segment: u64,
        name: &str,
        transition: F,
    ) -> StoreResult<Option<Arc<SegmentMembership>>>
    where
        F: FnOnce(&SegmentMembership) -> MembershipResult<Option<SegmentMembership>>,
    {
        let mut installed = self.installed.lock().unwrap();
        let current = installed
            .get(&segment)
            .cloned()
            .ok_or(StoreError::UnknownSegment(segment))?;

        let next = match transition(&current)? {
            Some(next) if next.version() > current.version() => next,
            _ => {
                self.metrics.increment_transitions_rejected();
                Logger::warn(
                    Event::TransitionRejected.as_str(),
                    &[
                        ("segment", &segment.to_string()),
                        ("transition", name),
                        ("version", &current.version().to_string()),
                    ],
                );
                return Ok(None);
            }
        };

        let version = next.version();
        let next = self.commit(&mut installed, segment, next)?;
        self.metrics.increment_transitions_applied();
        Logger::info(
            Event::TransitionApplied.as_str(),
            &[
                ("segment", &segment.to_string()),
                ("transition", name),
                ("from", &current.version().to_string()),
                ("to", &version.to_string()),
            ],
        );
        Ok(Some(next))
    }

    fn commit(
        &self,
        installed: &mut HashMap<u64, Arc<SegmentMembership>>,
        segment: u64,
        membership: SegmentMembership,
    ) -> StoreResult<Arc<SegmentMembership>> {
        self.sink.persist(segment, &membership)?;
        self.metrics.increment_snapshots_persisted();

        let membership = Arc::new(membership);
        installed.insert(segment, Arc::clone(&membership));
        Logger::info(
            Event::MembershipInstalled.as_str(),
            &[
                ("segment", &segment.to_string()),
                ("membership", &membership.to_string()),
            ],
        );
        Ok(membership)
    }

    /// Record a member's status on the installed membership.
    pub fn mark_member_io_status(
        &self,
        segment: u64,
        id: InstanceId,
        status: MemberIoStatus,
    ) -> StoreResult<bool> {
        let membership = self.get(segment).ok_or(StoreError::UnknownSegment(segment))?;
        let applied = membership.mark_member_io_status(id, status)?;
        if !applied {
            self.metrics.increment_status_moves_rejected();
        }
        Ok(applied)
    }

    /// Run the write policy of the segment's current form over one round.
    ///
    /// Binds the installed membership and its form to `ctx`, then returns
    /// whether the coordinator should resend immediately.
    pub fn process_write_round(
        &self,
        segment: u64,
        volume_type: VolumeType,
        alive: (u32, u32, u32),
        ctx: &mut IoActionContext,
    ) -> StoreResult<bool> {
        let membership = self.get(segment).ok_or(StoreError::UnknownSegment(segment))?;
        let form = SegmentForm::get_segment_form(&membership, volume_type)?;
        ctx.set_segment_form(form);
        ctx.set_membership_when_io_came(membership);

        let (primary, secondaries, joining) = alive;
        form.process_write_io_action_context(primary, secondaries, joining, ctx, volume_type);
        if ctx.is_resend_directly() {
            self.metrics.increment_resend_decisions();
        }
        Ok(ctx.is_resend_directly())
    }
}
