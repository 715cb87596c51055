//! Game time. The engine never reads the system clock directly: every
//! operation takes its "now" from an injected [`Clock`] so that tests and
//! replays are deterministic.

use chrono::{DateTime, Utc};
use std::cell::Cell;
use std::time::{SystemTime, UNIX_EPOCH};

/// Engine timestamps are UNIX seconds.
pub type Timestamp = i64;

pub const MINUTE: i64 = 60;
pub const HOUR: i64 = 60 * MINUTE;
pub const DAY: i64 = 24 * HOUR;
pub const WEEK: i64 = 7 * DAY;

/// Source of the current game time.
pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// Wall clock, used by the live bot.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default()
    }
}

/// Hand-settable clock for tests and replays.
#[derive(Debug)]
pub struct ManualClock(Cell<Timestamp>);

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        ManualClock(Cell::new(start))
    }

    pub fn set(&self, to: Timestamp) {
        self.0.set(to);
    }

    pub fn advance(&self, by: i64) {
        self.0.set(self.0.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.0.get()
    }
}

impl<C: Clock> Clock for &C {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

/// Renders a timestamp the way the bot has always announced deadlines.
pub fn timestr(ts: Timestamp) -> String {
    match DateTime::<Utc>::from_timestamp(ts, 0) {
        Some(when) => when.format("%Y-%m-%d %H:%M:%S GMT").to_string(),
        None => format!("@{}", ts),
    }
}

/// Compact remaining-duration text for status tables, e.g. "1d 3h" or "40m".
pub fn remaining_str(secs: i64) -> String {
    if secs <= 0 {
        return "expired".to_string();
    }
    let (days, rest) = (secs / DAY, secs % DAY);
    let (hours, rest) = (rest / HOUR, rest % HOUR);
    let minutes = rest / MINUTE;
    if days > 0 {
        format!("{}d {}h", days, hours)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m", minutes)
    } else {
        format!("{}s", secs)
    }
}
