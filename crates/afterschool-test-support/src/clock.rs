//! Test clock — deterministic `Clock` implementation for tests.

use afterschool_core::clock::Clock;
use chrono::{DateTime, TimeZone, Utc};

/// A clock that always returns a fixed point in time.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Default for FixedClock {
    /// 2026-01-15 10:00:00 UTC.
    fn default() -> Self {
        Self(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
