//! Market session clock checks.
//!
//! The engine only consumes two booleans from here: "is the market open"
//! and "is now within the close buffer". Timezone handling is the caller's
//! concern; timestamps are assumed to already be in exchange-local time.

use chrono::{Datelike, NaiveDateTime, NaiveTime, Weekday};

#[derive(Debug, Clone, PartialEq)]
pub struct MarketCalendar {
    pub open: NaiveTime,
    pub close: NaiveTime,
    pub close_buffer_minutes: i64,
}

impl Default for MarketCalendar {
    fn default() -> Self {
        MarketCalendar {
            open: NaiveTime::from_hms_opt(9, 30, 0).expect("valid open time"),
            close: NaiveTime::from_hms_opt(16, 0, 0).expect("valid close time"),
            close_buffer_minutes: 10,
        }
    }
}

impl MarketCalendar {
    /// Seconds until the session close; negative after the close.
    fn seconds_to_close(&self, now: NaiveDateTime) -> i64 {
        (self.close - now.time()).num_seconds()
    }

    /// Within `close_buffer_minutes` before the close (inclusive on both ends).
    pub fn is_near_close(&self, now: NaiveDateTime) -> bool {
        let remaining = self.seconds_to_close(now);
        remaining >= 0 && remaining <= self.close_buffer_minutes * 60
    }

    /// Weekday and inside session hours.
    pub fn is_open(&self, now: NaiveDateTime) -> bool {
        let weekday = now.weekday();
        if weekday == Weekday::Sat || weekday == Weekday::Sun {
            return false;
        }
        let time = now.time();
        time >= self.open && time < self.close
    }
}
