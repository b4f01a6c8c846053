//! Membership event log
//!
//! Every decision the engine takes that is worth a trace ends up here as
//! a single JSON object on its own line. Keys are `event`, `severity`, then
//! the caller's fields in key order, so two runs over the same input give
//! byte-identical logs. Lines at ERROR and above are written to stderr;
//! lines below the process-wide minimum (INFO by default) are dropped
//! before anything is formatted.

use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicU8, Ordering};

use serde_json::Value;

use super::events::Event;

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Per-round decisions
    Trace = 0,
    /// Normal operations
    Info = 1,
    /// Rejected transitions and status moves
    Warn = 2,
    /// Refused memberships and impossible writes
    Error = 3,
    /// Corrupted persisted state
    Fatal = 4,
}

impl Severity {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }

    fn from_u8(value: u8) -> Severity {
        match value {
            0 => Severity::Trace,
            1 => Severity::Info,
            2 => Severity::Warn,
            3 => Severity::Error,
            _ => Severity::Fatal,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

static MIN_SEVERITY: AtomicU8 = AtomicU8::new(Severity::Info as u8);

/// A structured logger that outputs JSON logs
pub struct Logger;

impl Logger {
    /// Drop every line below `severity` from now on.
    pub fn set_min_severity(severity: Severity) {
        MIN_SEVERITY.store(severity as u8, Ordering::Relaxed);
    }

    pub fn min_severity() -> Severity {
        Severity::from_u8(MIN_SEVERITY.load(Ordering::Relaxed))
    }

    pub fn enabled(severity: Severity) -> bool {
        severity >= Self::min_severity()
    }

    /// Log an event with the given severity and fields
    ///
    /// Fields are output in deterministic order (alphabetical by key)
    pub fn log(severity: Severity, event: &str, fields: &[(&str, &str)]) {
        if !Self::enabled(severity) {
            return;
        }
        if severity >= Severity::Error {
            Self::log_to_writer(severity, event, fields, &mut io::stderr());
        } else {
            Self::log_to_writer(severity, event, fields, &mut io::stdout());
        }
    }

    /// Log a typed event; fatal events are raised to FATAL.
    pub fn event(severity: Severity, event: Event, fields: &[(&str, &str)]) {
        let severity = if event.is_fatal() {
            Severity::Fatal
        } else {
            severity
        };
        Self::log(severity, event.as_str(), fields);
    }

    fn log_to_writer<W: Write>(
        severity: Severity,
        event: &str,
        fields: &[(&str, &str)],
        writer: &mut W,
    ) {
        let line = render_line(severity, event, fields);
        // one write per line keeps concurrent rounds from interleaving
        let _ = writer.write_all(line.as_bytes());
        let _ = writer.flush();
    }

    /// Log at TRACE level
    pub fn trace(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Trace, event, fields);
    }

    /// Log at INFO level
    pub fn info(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Info, event, fields);
    }

    /// Log at WARN level
    pub fn warn(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Warn, event, fields);
    }

    /// Log at ERROR level
    pub fn error(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Error, event, fields);
    }
}

/// Render one log line, newline included.
fn render_line(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
    let mut ordered: Vec<&(&str, &str)> = fields.iter().collect();
    ordered.sort_by_key(|(key, _)| *key);

    let mut line = format!(
        "{{\"event\":{},\"severity\":\"{}\"",
        quoted(event),
        severity
    );
    for (key, value) in ordered {
        line.push(',');
        line.push_str(&quoted(key));
        line.push(':');
        line.push_str(&quoted(value));
    }
    line.push_str("}\n");
    line
}

fn quoted(s: &str) -> String {
    Value::from(s).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Value {
        serde_json::from_str(line).unwrap()
    }

    #[test]
    fn test_severity_order_and_names() {
        let all = [
            Severity::Trace,
            Severity::Info,
            Severity::Warn,
            Severity::Error,
            Severity::Fatal,
        ];
        assert!(all.windows(2).all(|w| w[0] < w[1]));
        for severity in all {
            assert_eq!(Severity::from_u8(severity as u8), severity);
        }
        assert_eq!(Severity::Warn.to_string(), "WARN");
    }

    #[test]
    fn test_line_layout() {
        let line = render_line(
            Severity::Info,
            Event::MembershipInstalled.as_str(),
            &[("segment", "12"), ("membership", "1,0,1,-1,2:3,,,,-1,-1")],
        );
        assert!(line.starts_with(r#"{"event":"MEMBERSHIP_INSTALLED","severity":"INFO","#));
        assert_eq!(line.matches('\n').count(), 1);
        assert!(line.find("\"membership\"").unwrap() < line.find("\"segment\"").unwrap());

        let parsed = parse(&line);
        assert_eq!(parsed["segment"], "12");
    }

    #[test]
    fn test_field_order_does_not_matter() {
        let a = render_line(Severity::Warn, "X", &[("to", "2"), ("from", "1")]);
        let b = render_line(Severity::Warn, "X", &[("from", "1"), ("to", "2")]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_values_are_escaped() {
        let line = render_line(Severity::Error, "X", &[("reason", "bad \"content\"\n\u{1}")]);
        assert_eq!(parse(&line)["reason"], "bad \"content\"\n\u{1}");
    }

    #[test]
    fn test_min_severity_filter() {
        let previous = Logger::min_severity();
        Logger::set_min_severity(Severity::Warn);
        assert!(!Logger::enabled(Severity::Info));
        assert!(Logger::enabled(Severity::Error));
        Logger::set_min_severity(previous);
        assert!(Logger::enabled(Severity::Fatal));
    }

    #[test]
    fn test_written_line_matches_render() {
        let mut buffer = Vec::new();
        Logger::log_to_writer(
            Severity::Warn,
            Event::TransitionRejected.as_str(),
            &[("transition", "remove_secondary")],
            &mut buffer,
        );
        let written = String::from_utf8(buffer).unwrap();
        assert_eq!(
            written,
            render_line(
                Severity::Warn,
                "MEMBERSHIP_TRANSITION_REJECTED",
                &[("transition", "remove_secondary")]
            )
        );
    }
}
