use std::collections::BTreeMap;

use chrono::{FixedOffset, NaiveDate};

use super::calendar::local_datetime;
use super::month_events;
use super::pairing::pair_live_sessions;
use crate::model::attendance::{AttendanceAction, AttendanceEvent, SessionKind};
use crate::model::summary::{DailySummary, DayStatus};

/// One row per local date on which `employee_name` has activity in
/// `month_index`, oldest first.
pub fn daily_summaries(
    events: &[AttendanceEvent],
    employee_name: &str,
    month_index: u32,
    offset: &FixedOffset,
) -> Vec<DailySummary> {
    let month: Vec<&AttendanceEvent> = month_events(events, month_index)
        .into_iter()
        .filter(|e| e.employee_name == employee_name)
        .collect();

    let mut days: BTreeMap<NaiveDate, DailySummary> = BTreeMap::new();

    for event in month.iter().filter(|e| e.session_kind == SessionKind::General) {
        let Some(local) = local_datetime(event.occurred_at, offset) else {
            continue;
        };
        let date = local.date_naive();
        let row = days
            .entry(date)
            .or_insert_with(|| DailySummary::empty(date));

        match event.action {
            AttendanceAction::ClockIn => {
                row.clock_in = Some(local.time());
                row.status = DayStatus::Present;
                row.note = None;
            }
            AttendanceAction::ClockOut => row.clock_out = Some(local.time()),
            AttendanceAction::LeaveRequest => {
                row.status = DayStatus::Leave;
                row.note = event.note.clone();
            }
            AttendanceAction::SickRequest => {
                row.status = DayStatus::Sick;
                row.note = event.note.clone();
            }
        }
    }

    for session in pair_live_sessions(&month, offset) {
        days.entry(session.date)
            .or_insert_with(|| DailySummary::empty(session.date))
            .live_hours += session.hours();
    }

    days.into_values().collect()
}
