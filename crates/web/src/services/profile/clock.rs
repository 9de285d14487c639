//! Monotonic timestamps for `updated_at`.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, TimeDelta, Utc};

/// Issues `updated_at` values that strictly increase.
///
/// Two writes in the same microsecond (or a wall clock stepping backwards)
/// would otherwise produce equal or decreasing timestamps; each value is
/// bumped to at least one microsecond past the previous one.
#[derive(Debug)]
pub struct UpdateClock {
    now: fn() -> DateTime<Utc>,
    last: Mutex<Option<DateTime<Utc>>>,
}

impl Default for UpdateClock {
    fn default() -> Self {
        Self::with_source(Utc::now)
    }
}

impl UpdateClock {
    /// Create a clock over an arbitrary time source.
    #[must_use]
    pub const fn with_source(now: fn() -> DateTime<Utc>) -> Self {
        Self {
            now,
            last: Mutex::new(None),
        }
    }

    /// The next write timestamp.
    pub fn next(&self) -> DateTime<Utc> {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        let now = (self.now)();

        let issued = match *last {
            Some(prev) if now <= prev => prev + TimeDelta::microseconds(1),
            _ => now,
        };
        *last = Some(issued);
        issued
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn frozen() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).single().unwrap_or_default()
    }

    #[test]
    fn test_frozen_source_still_increases() {
        let clock = UpdateClock::with_source(frozen);

        let first = clock.next();
        let second = clock.next();
        let third = clock.next();

        assert_eq!(first, frozen());
        assert!(second > first);
        assert!(third > second);
        assert_eq!(third - first, TimeDelta::microseconds(2));
    }

    #[test]
    fn test_wall_clock_is_monotonic() {
        let clock = UpdateClock::default();
        let mut prev = clock.next();
        for _ in 0..100 {
            let next = clock.next();
            assert!(next > prev);
            prev = next;
        }
    }
}
