//! Injectable run clock
//!
//! Every date stamped into history (`valid_from`, `valid_to`) and every
//! quality log timestamp comes from a [`Clock`], never from the wall clock
//! directly.

use chrono::{Days, Local, NaiveDate, NaiveDateTime};

/// Source of "today" and "now" for a run.
pub trait Clock: Send + Sync {
    /// Calendar date of the run.
    fn today(&self) -> NaiveDate;

    /// Timestamp used for audit records.
    fn now(&self) -> NaiveDateTime;

    /// The day before [`Clock::today`]; closed versions end here.
    fn yesterday(&self) -> NaiveDate {
        let today = self.today();
        today.checked_sub_days(Days::new(1)).unwrap_or(today)
    }
}

/// Local wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock pinned to one date, used by tests and `--as-of`.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    today: NaiveDate,
}

impl FixedClock {
    /// Pin the run to `today`.
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.today
    }

    fn now(&self) -> NaiveDateTime {
        self.today.and_time(chrono::NaiveTime::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_yesterday() {
        let clock = FixedClock::new(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(
            clock.yesterday(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
    }

    #[test]
    fn test_fixed_clock_now_is_midnight() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let clock = FixedClock::new(day);
        assert_eq!(clock.now().date(), day);
        assert_eq!(clock.now().time(), chrono::NaiveTime::MIN);
    }
}
