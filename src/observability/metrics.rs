//! Membership counters
//!
//! - Counters only
//! - Monotonic increase
//! - Reset only on process start
//! - Thread-safe but lock-minimal

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters of the membership engine
///
/// All counters use Relaxed atomics; they are read only for reporting.
#[derive(Debug, Default)]
pub struct MembershipMetrics {
    transitions_applied: AtomicU64,
    transitions_rejected: AtomicU64,
    status_moves_rejected: AtomicU64,
    resend_decisions: AtomicU64,
    installs_accepted: AtomicU64,
    installs_refused: AtomicU64,
    snapshots_persisted: AtomicU64,
}

impl MembershipMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_transitions_applied(&self) {
        self.transitions_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_transitions_rejected(&self) {
        self.transitions_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_status_moves_rejected(&self) {
        self.status_moves_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_resend_decisions(&self) {
        self.resend_decisions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_installs_accepted(&self) {
        self.installs_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_installs_refused(&self) {
        self.installs_refused.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_snapshots_persisted(&self) {
        self.snapshots_persisted.fetch_add(1, Ordering::Relaxed);
    }

    /// Current values as a JSON object
    pub fn to_json(&self) -> String {
        let s = self.snapshot();
        format!(
            r#"{{"transitions_applied":{},"transitions_rejected":{},"status_moves_rejected":{},"resend_decisions":{},"installs_accepted":{},"installs_refused":{},"snapshots_persisted":{}}}"#,
            s.transitions_applied,
            s.transitions_rejected,
            s.status_moves_rejected,
            s.resend_decisions,
            s.installs_accepted,
            s.installs_refused,
            s.snapshots_persisted,
        )
    }

    /// Get all counters as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            transitions_applied: self.transitions_applied.load(Ordering::Relaxed),
            transitions_rejected: self.transitions_rejected.load(Ordering::Relaxed),
            status_moves_rejected: self.status_moves_rejected.load(Ordering::Relaxed),
            resend_decisions: self.resend_decisions.load(Ordering::Relaxed),
            installs_accepted: self.installs_accepted.load(Ordering::Relaxed),
            installs_refused: self.installs_refused.load(Ordering::Relaxed),
            snapshots_persisted: self.snapshots_persisted.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub transitions_applied: u64,
    pub transitions_rejected: u64,
    pub status_moves_rejected: u64,
    pub resend_decisions: u64,
    pub installs_accepted: u64,
    pub installs_refused: u64,
    pub snapshots_persisted: u64,
}
