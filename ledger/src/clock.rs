//! Timestamp source for new blocks.
//!
//! The ledger never reads the system clock directly. Block timestamps come
//! from a [`Clock`], which lets tests build byte-identical ledgers and lets
//! embedders supply their own time source.

use chrono::{SecondsFormat, Utc};

/// Produces ISO-8601 timestamps for block construction.
pub trait Clock: Send + Sync {
    /// The current time as an ISO-8601 string.
    fn now_iso8601(&self) -> String;
}

/// Wall-clock time in UTC with microsecond precision,
/// e.g. `2026-10-16T09:41:07.123456Z`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_iso8601(&self) -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone)]
pub struct FixedClock(String);

impl FixedClock {
    pub fn new(timestamp: impl Into<String>) -> Self {
        Self(timestamp.into())
    }
}

impl Clock for FixedClock {
    fn now_iso8601(&self) -> String {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn system_clock_is_rfc3339() {
        let ts = SystemClock.now_iso8601();
        assert!(DateTime::parse_from_rfc3339(&ts).is_ok(), "bad timestamp {ts}");
        assert!(ts.ends_with('Z'));
    }

    #[test]
    fn fixed_clock_never_moves() {
        let clock = FixedClock::new("2026-01-01T00:00:00.000000Z");
        assert_eq!(clock.now_iso8601(), clock.now_iso8601());
    }
}
