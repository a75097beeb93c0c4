//! Test clock: deterministic `Clock` implementation for tests.

use chrono::{DateTime, Duration, TimeZone, Utc};
use kitchen_core::clock::Clock;

/// The instant every test clock starts from unless told otherwise.
///
/// # Panics
///
/// Never; the literal date is valid.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
}

/// A clock that always returns a fixed point in time.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// A clock pinned at [`fixed_now`].
    #[must_use]
    pub fn at_fixed_now() -> Self {
        Self(fixed_now())
    }

    /// A new clock `seconds` later than this one.
    #[must_use]
    pub fn advanced_by(self, seconds: i64) -> Self {
        Self(self.0 + Duration::seconds(seconds))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
