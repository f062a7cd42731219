use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use utoipa::ToSchema;

use super::attendance::AttendanceEvent;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DayStatus {
    NotYetClockedIn,
    Present,
    Leave,
    Sick,
}

/// Today's General-session state for one employee.
#[derive(Debug, Clone, PartialEq)]
pub struct TodayStatus {
    pub status: DayStatus,
    pub clock_in: Option<NaiveTime>,
    pub clock_out: Option<NaiveTime>,
    pub note: Option<String>,
}

impl Default for TodayStatus {
    fn default() -> Self {
        Self {
            status: DayStatus::NotYetClockedIn,
            clock_in: None,
            clock_out: None,
            note: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySummary {
    pub employee_name: String,
    pub present_days: u32,
    pub leave_days: u32,
    pub sick_days: u32,
    pub live_hours: f64,
    pub live_pay: f64,
    /// Live clock-ins with no same-day clock-out. They add nothing to hours or pay.
    pub unpaired_live_sessions: u32,
    pub today: TodayStatus,
    /// The employee's events for the month, oldest first.
    pub logs: Vec<AttendanceEvent>,
}

impl MonthlySummary {
    pub fn empty(employee_name: &str) -> Self {
        Self {
            employee_name: employee_name.to_string(),
            present_days: 0,
            leave_days: 0,
            sick_days: 0,
            live_hours: 0.0,
            live_pay: 0.0,
            unpaired_live_sessions: 0,
            today: TodayStatus::default(),
            logs: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub clock_in: Option<NaiveTime>,
    pub clock_out: Option<NaiveTime>,
    pub status: DayStatus,
    pub note: Option<String>,
    pub live_hours: f64,
}

impl DailySummary {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            clock_in: None,
            clock_out: None,
            status: DayStatus::NotYetClockedIn,
            note: None,
            live_hours: 0.0,
        }
    }
}
