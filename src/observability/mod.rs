//! Observability for the membership engine
//!
//! - Structured JSON logging, one event per line
//! - Relaxed atomic counters for transitions, resends and installs
//! - A closed set of event names
//!
//! Nothing in here feeds back into a membership decision.
//!
//! # Usage
//!
//! ```ignore
//! use segquorum::observability::{Event, Logger, MembershipMetrics};
//!
//! Logger::warn(Event::TransitionRejected.as_str(), &[("member", "7")]);
//!
//! let metrics = MembershipMetrics::new();
//! metrics.increment_transitions_applied();
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MembershipMetrics, MetricsSnapshot};
