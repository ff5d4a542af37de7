use chrono::{FixedOffset, Utc};

use crate::limits::{CLOSED_FROM, CLOSED_TO};
use crate::model::TimeOfDay;

/// Booking is closed for `now` in `[CLOSED_FROM, CLOSED_TO)` and open otherwise.
pub fn is_open(now: TimeOfDay) -> bool {
    !(CLOSED_FROM <= now && now < CLOSED_TO)
}

/// Source of the current time of day.
pub trait Clock: Send + Sync {
    fn time_of_day(&self) -> TimeOfDay;
}

/// Reads the system clock, shifted into a fixed UTC offset.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }
}

impl Clock for SystemClock {
    fn time_of_day(&self) -> TimeOfDay {
        Utc::now().with_timezone(&self.offset).time()
    }
}

/// Always reports the same time.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub TimeOfDay);

impl Clock for FixedClock {
    fn time_of_day(&self) -> TimeOfDay {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32, s: u32) -> TimeOfDay {
        TimeOfDay::from_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn midnight_is_closed() {
        assert!(!is_open(at(0, 0, 0)));
    }

    #[test]
    fn early_morning_is_closed() {
        assert!(!is_open(at(3, 0, 0)));
        assert!(!is_open(at(5, 59, 59)));
        assert!(!is_open(TimeOfDay::from_hms_milli_opt(5, 59, 59, 999).unwrap()));
    }

    #[test]
    fn six_sharp_opens() {
        assert!(is_open(at(6, 0, 0)));
    }

    #[test]
    fn day_and_evening_are_open() {
        assert!(is_open(at(12, 0, 0)));
        assert!(is_open(at(23, 59, 59)));
    }

    #[test]
    fn fixed_clock_reports_its_time() {
        let clock = FixedClock(at(3, 0, 0));
        assert_eq!(clock.time_of_day(), at(3, 0, 0));
    }
}
