//! Clock collaborator for calendar-day and wall-clock decisions.
//!
//! Streak accounting and the late-dinner check compare against local
//! wall-clock time, so the clock hands out offset-carrying instants
//! instead of letting callers reach for ambient locale state.

use chrono::{DateTime, FixedOffset, Local, NaiveDate};
use std::cell::RefCell;
use std::rc::Rc;

/// Source of "now" and "today" for the engine and journal
pub trait Clock {
    /// Current instant with its local UTC offset
    fn now(&self) -> DateTime<FixedOffset>;

    /// Current calendar day, derived from the same instant as `now`
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Clock backed by the system's local time
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// Settable clock for tests and simulations.
///
/// Clones share the same instant, so a handle kept outside an engine
/// can advance the clock the engine owns.
#[derive(Clone, Debug)]
pub struct ManualClock {
    now: Rc<RefCell<DateTime<FixedOffset>>>,
}

impl ManualClock {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self {
            now: Rc::new(RefCell::new(now)),
        }
    }

    /// Move the clock to a new instant
    pub fn set(&self, now: DateTime<FixedOffset>) {
        *self.now.borrow_mut() = now;
    }

    /// Advance the clock by a whole number of days
    pub fn advance_days(&self, days: i64) {
        let next = *self.now.borrow() + chrono::Duration::days(days);
        *self.now.borrow_mut() = next;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<FixedOffset> {
        *self.now.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instant(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn test_today_tracks_now() {
        let clock = ManualClock::new(instant("2024-03-01T22:15:00+03:00"));
        assert_eq!(
            clock.today(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );

        clock.advance_days(2);
        assert_eq!(
            clock.today(),
            NaiveDate::from_ymd_opt(2024, 3, 3).unwrap()
        );
    }

    #[test]
    fn test_today_uses_local_offset() {
        // 01:30 at +03:00 is already March 1st locally even though UTC
        // is still on February 29th
        let clock = ManualClock::new(instant("2024-03-01T01:30:00+03:00"));
        assert_eq!(
            clock.today(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
    }
}
