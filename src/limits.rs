use std::time::Duration;

use chrono::NaiveTime;

/// Largest inventory a single process will hold.
pub const MAX_CAPACITY: u32 = 1_000_000;

pub const MAX_CLIENT_NAME_LEN: usize = 256;

/// Bounded wait for capacity budget.
pub const ACQUIRE_TIMEOUT: Duration = Duration::from_millis(200);

/// Blackout window `[CLOSED_FROM, CLOSED_TO)`.
pub const CLOSED_FROM: NaiveTime = hm(0, 0);
pub const CLOSED_TO: NaiveTime = hm(6, 0);

const fn hm(hour: u32, min: u32) -> NaiveTime {
    match NaiveTime::from_hms_opt(hour, min, 0) {
        Some(t) => t,
        None => panic!("invalid blackout bound"),
    }
}

pub const MONITOR_INTERVAL: Duration = Duration::from_millis(100);

/// Pre-request jitter range in ms, `[min, max)`.
pub const JITTER_MIN_MS: u64 = 20;
pub const JITTER_MAX_MS: u64 = 120;

pub const DEFAULT_CAPACITY: u32 = 10;
