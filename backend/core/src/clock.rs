//! Injected time source.
//!
//! The whole runtime reasons about time in one fixed-offset zone so that
//! deadline arithmetic and window predicates are deterministic and
//! reproducible in tests. Nothing outside this module calls `Utc::now()`.

use std::sync::Mutex;

use chrono::{DateTime, FixedOffset, Utc};

/// Source of "now" in the program's fixed zone.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Wall clock pinned to a fixed offset chosen at construction.
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Clock for a whole-hour UTC offset (e.g. +3 for the default program zone).
    pub fn at_utc_offset_hours(hours: i32) -> Self {
        let offset = FixedOffset::east_opt(hours * 3600)
            .unwrap_or_else(|| FixedOffset::east_opt(0).unwrap());
        Self::new(offset)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }
}

/// Manually advanced clock for tests.
pub struct FixedClock {
    now: Mutex<DateTime<FixedOffset>>,
}

impl FixedClock {
    pub fn at(now: DateTime<FixedOffset>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn set(&self, now: DateTime<FixedOffset>) {
        *self.now.lock().unwrap() = now;
    }

    pub fn advance(&self, delta: chrono::Duration) {
        let mut guard = self.now.lock().unwrap();
        *guard += delta;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        *self.now.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn fixed_clock_advances() {
        let zone = FixedOffset::east_opt(3 * 3600).unwrap();
        let start = zone.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let clock = FixedClock::at(start);
        assert_eq!(clock.now(), start);

        clock.advance(chrono::Duration::minutes(31));
        assert_eq!(clock.now(), start + chrono::Duration::minutes(31));
    }

    #[test]
    fn system_clock_keeps_offset() {
        let clock = SystemClock::at_utc_offset_hours(3);
        let now = clock.now();
        assert_eq!(now.offset().local_minus_utc(), 3 * 3600);
    }
}
