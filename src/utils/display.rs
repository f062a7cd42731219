//! Human-facing strings derived from timestamps at the response boundary.

use chrono::{FixedOffset, NaiveTime};

use crate::engine::calendar::local_datetime;

pub const NO_TIME: &str = "--:--";

/// `HH:MM`, or `--:--` when absent.
pub fn clock_label(time: Option<NaiveTime>) -> String {
    time.map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|| NO_TIME.to_string())
}

/// The `waktu` field.
pub fn waktu(millis: i64, offset: &FixedOffset) -> String {
    clock_label(local_datetime(millis, offset).map(|dt| dt.time()))
}

/// The `tanggal_display` field, `DD/MM/YYYY`.
pub fn tanggal_display(millis: i64, offset: &FixedOffset) -> String {
    local_datetime(millis, offset)
        .map(|dt| dt.format("%d/%m/%Y").to_string())
        .unwrap_or_default()
}
