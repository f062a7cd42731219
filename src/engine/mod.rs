//! Attendance aggregation.
//!
//! Everything here is synchronous and free of I/O. Callers fetch events and
//! the roster, build an [`AggregationContext`] from the wall clock, and run
//! the reduction again whenever the underlying data changes.

pub mod aggregate;
pub mod calendar;
pub mod daily;
pub mod pairing;

use chrono::{FixedOffset, NaiveDate};

use crate::model::attendance::AttendanceEvent;

pub use aggregate::aggregate_month;
pub use daily::daily_summaries;

/// Pay per Live-session hour, in rupiah.
pub const LIVE_HOURLY_RATE: f64 = 25_000.0;

pub const MILLIS_PER_HOUR: f64 = 3_600_000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregationContext {
    /// Local calendar date treated as "today".
    pub today: NaiveDate,
    pub offset: FixedOffset,
    pub hourly_rate: f64,
}

impl AggregationContext {
    pub fn new(today: NaiveDate, offset: FixedOffset) -> Self {
        Self {
            today,
            offset,
            hourly_rate: LIVE_HOURLY_RATE,
        }
    }

    pub fn with_hourly_rate(mut self, hourly_rate: f64) -> Self {
        self.hourly_rate = hourly_rate;
        self
    }
}

/// Events of one month, oldest first. Equal timestamps keep id order so
/// repeated runs see the same sequence.
pub(crate) fn month_events(events: &[AttendanceEvent], month_index: u32) -> Vec<&AttendanceEvent> {
    let mut month: Vec<&AttendanceEvent> = events
        .iter()
        .filter(|e| e.month_index == month_index)
        .collect();
    month.sort_by_key(|e| (e.occurred_at, e.id));
    month
}
