//! Calendar arithmetic over epoch-millisecond timestamps in a fixed UTC offset.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime};

use crate::model::attendance::TimeWindow;

pub fn local_datetime(millis: i64, offset: &FixedOffset) -> Option<DateTime<FixedOffset>> {
    DateTime::from_timestamp_millis(millis).map(|utc| utc.with_timezone(offset))
}

pub fn local_date(millis: i64, offset: &FixedOffset) -> Option<NaiveDate> {
    local_datetime(millis, offset).map(|dt| dt.date_naive())
}

pub fn local_time(millis: i64, offset: &FixedOffset) -> Option<NaiveTime> {
    local_datetime(millis, offset).map(|dt| dt.time())
}

/// 0-based month of the local calendar date.
pub fn month_index_of(millis: i64, offset: &FixedOffset) -> Option<u32> {
    local_date(millis, offset).map(|d| d.month0())
}

/// Epoch millis of `date` at `time` in `offset`.
pub fn local_millis(date: NaiveDate, time: NaiveTime, offset: &FixedOffset) -> Option<i64> {
    date.and_time(time)
        .and_local_timezone(*offset)
        .single()
        .map(|dt| dt.timestamp_millis())
}

pub fn day_window(date: NaiveDate, offset: &FixedOffset) -> Option<TimeWindow> {
    let next = date.succ_opt()?;
    Some(TimeWindow {
        start: local_millis(date, NaiveTime::MIN, offset)?,
        end: local_millis(next, NaiveTime::MIN, offset)?,
    })
}

pub fn month_window(year: i32, month_index: u32, offset: &FixedOffset) -> Option<TimeWindow> {
    if month_index > 11 {
        return None;
    }
    let first = NaiveDate::from_ymd_opt(year, month_index + 1, 1)?;
    let next = if month_index == 11 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month_index + 2, 1)?
    };
    Some(TimeWindow {
        start: local_millis(first, NaiveTime::MIN, offset)?,
        end: local_millis(next, NaiveTime::MIN, offset)?,
    })
}

/// Accepts `+07:00`, `+0700`, `-3`, `UTC`.
pub fn parse_offset(raw: &str) -> Option<FixedOffset> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("utc") || trimmed.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0);
    }

    let (sign, rest) = if let Some(rest) = trimmed.strip_prefix('+') {
        (1, rest)
    } else if let Some(rest) = trimmed.strip_prefix('-') {
        (-1, rest)
    } else {
        return None;
    };

    let (hours, minutes) = if let Some((h, m)) = rest.split_once(':') {
        (h.parse::<i32>().ok()?, m.parse::<i32>().ok()?)
    } else if rest.len() == 4 {
        let (h, m) = rest.split_at(2);
        (h.parse::<i32>().ok()?, m.parse::<i32>().ok()?)
    } else {
        (rest.parse::<i32>().ok()?, 0)
    };

    if hours > 14 || minutes > 59 {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
