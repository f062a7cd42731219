use std::collections::BTreeMap;

use super::calendar::local_datetime;
use super::pairing::pair_live_sessions;
use super::{AggregationContext, month_events};
use crate::model::attendance::{AttendanceAction, AttendanceEvent, SessionKind};
use crate::model::employee::EmployeeProfile;
use crate::model::summary::{DayStatus, MonthlySummary};

/// Reduces `events` into one [`MonthlySummary`] per roster member for
/// `month_index` (0-11).
///
/// Input order does not matter. Events naming someone outside the roster
/// are skipped, as are duplicates' effects beyond plain counting: the
/// engine neither deduplicates nor checks capabilities. "Today" fields only
/// react to events on `ctx.today`, and within that day the latest event
/// wins.
///
/// A Live clock-out closes at most one session: after In 09:00, In 10:00,
/// Out 11:00 the first session earns 2h and the second stays unpaired.
pub fn aggregate_month(
    events: &[AttendanceEvent],
    month_index: u32,
    roster: &[EmployeeProfile],
    ctx: &AggregationContext,
) -> BTreeMap<String, MonthlySummary> {
    let month = month_events(events, month_index);

    let mut summaries: BTreeMap<String, MonthlySummary> = roster
        .iter()
        .map(|p| (p.display_name.clone(), MonthlySummary::empty(&p.display_name)))
        .collect();

    for event in month.iter().copied() {
        let Some(summary) = summaries.get_mut(&event.employee_name) else {
            continue;
        };
        summary.logs.push(event.clone());
        if event.session_kind == SessionKind::General {
            apply_general(summary, event, ctx);
        }
    }

    for session in pair_live_sessions(&month, &ctx.offset) {
        let Some(summary) = summaries.get_mut(&session.clock_in.employee_name) else {
            continue;
        };
        if session.is_paired() {
            let hours = session.hours();
            summary.live_hours += hours;
            summary.live_pay += hours * ctx.hourly_rate;
        } else {
            summary.unpaired_live_sessions += 1;
        }
    }

    summaries
}

fn apply_general(summary: &mut MonthlySummary, event: &AttendanceEvent, ctx: &AggregationContext) {
    let local = local_datetime(event.occurred_at, &ctx.offset);
    let is_today = local.is_some_and(|dt| dt.date_naive() == ctx.today);
    let time = local.map(|dt| dt.time());
    let today = &mut summary.today;

    match event.action {
        AttendanceAction::ClockIn => {
            summary.present_days += 1;
            if is_today {
                today.status = DayStatus::Present;
                today.clock_in = time;
                today.note = None;
            }
        }
        AttendanceAction::ClockOut => {
            if is_today {
                today.clock_out = time;
            }
        }
        AttendanceAction::LeaveRequest => {
            summary.leave_days += 1;
            if is_today {
                today.status = DayStatus::Leave;
                today.note = event.note.clone();
            }
        }
        AttendanceAction::SickRequest => {
            summary.sick_days += 1;
            if is_today {
                today.status = DayStatus::Sick;
                today.note = event.note.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{at, day, event, profile, wib};
    use crate::model::attendance::AttendanceAction::{
        ClockIn, ClockOut, LeaveRequest, SickRequest,
    };
    use crate::model::attendance::SessionKind::{General, Live};
    use chrono::NaiveTime;
    use rstest::{fixture, rstest};

    const OCTOBER: u32 = 9;

    #[fixture]
    fn roster() -> Vec<EmployeeProfile> {
        vec![profile(1, "Dina"), profile(2, "Rudi")]
    }

    #[fixture]
    fn ctx() -> AggregationContext {
        AggregationContext::new(day(14), wib())
    }

    fn hm(hhmm: &str) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(hhmm, "%H:%M").ok()
    }

    #[rstest]
    fn every_roster_member_starts_zeroed(roster: Vec<EmployeeProfile>, ctx: AggregationContext) {
        let out = aggregate_month(&[], OCTOBER, &roster, &ctx);
        assert_eq!(out.len(), 2);
        let rudi = &out["Rudi"];
        assert_eq!(rudi, &MonthlySummary::empty("Rudi"));
        assert_eq!(rudi.today.status, DayStatus::NotYetClockedIn);
        assert!(rudi.today.clock_in.is_none());
    }

    #[rstest]
    fn live_session_pays_hourly(roster: Vec<EmployeeProfile>, ctx: AggregationContext) {
        let events = vec![
            event(1, "Dina", Live, ClockIn, at(5, "10:00")),
            event(2, "Dina", Live, ClockOut, at(5, "14:30")),
        ];
        let out = aggregate_month(&events, OCTOBER, &roster, &ctx);
        assert_eq!(out["Dina"].live_hours, 4.5);
        assert_eq!(out["Dina"].live_pay, 112_500.0);
        assert_eq!(out["Dina"].unpaired_live_sessions, 0);
    }

    #[rstest]
    fn unpaired_live_clock_in_earns_nothing(roster: Vec<EmployeeProfile>, ctx: AggregationContext) {
        let events = vec![event(1, "Dina", Live, ClockIn, at(5, "10:00"))];
        let out = aggregate_month(&events, OCTOBER, &roster, &ctx);
        assert_eq!(out["Dina"].live_hours, 0.0);
        assert_eq!(out["Dina"].live_pay, 0.0);
        assert_eq!(out["Dina"].unpaired_live_sessions, 1);
    }

    #[rstest]
    fn one_clock_out_closes_one_session(roster: Vec<EmployeeProfile>, ctx: AggregationContext) {
        let events = vec![
            event(1, "Dina", Live, ClockIn, at(5, "09:00")),
            event(2, "Dina", Live, ClockIn, at(5, "10:00")),
            event(3, "Dina", Live, ClockOut, at(5, "11:00")),
        ];
        let out = aggregate_month(&events, OCTOBER, &roster, &ctx);
        assert_eq!(out["Dina"].live_hours, 2.0);
        assert_eq!(out["Dina"].unpaired_live_sessions, 1);
    }

    #[rstest]
    fn clock_out_next_day_does_not_pair(roster: Vec<EmployeeProfile>, ctx: AggregationContext) {
        let events = vec![
            event(1, "Dina", Live, ClockIn, at(5, "23:50")),
            event(2, "Dina", Live, ClockOut, at(6, "00:20")),
        ];
        let out = aggregate_month(&events, OCTOBER, &roster, &ctx);
        assert_eq!(out["Dina"].live_hours, 0.0);
        assert_eq!(out["Dina"].unpaired_live_sessions, 1);
    }

    #[rstest]
    fn counts_general_days(roster: Vec<EmployeeProfile>, ctx: AggregationContext) {
        let mut events: Vec<_> = (1..=5)
            .map(|d| event(u64::from(d), "Dina", General, ClockIn, at(d, "08:00")))
            .collect();
        events.push(event(10, "Dina", General, LeaveRequest, at(6, "08:00")));
        events.push(event(11, "Dina", General, LeaveRequest, at(7, "08:00")));
        events.push(event(12, "Dina", General, SickRequest, at(8, "08:00")));
        let out = aggregate_month(&events, OCTOBER, &roster, &ctx);
        let dina = &out["Dina"];
        assert_eq!((dina.present_days, dina.leave_days, dina.sick_days), (5, 2, 1));
        assert_eq!(dina.logs.len(), 8);
        assert_eq!(out["Rudi"].present_days, 0);
    }

    #[rstest]
    fn later_event_today_decides_status(roster: Vec<EmployeeProfile>, ctx: AggregationContext) {
        // Supplied newest first; the engine must sort before reducing.
        let events = vec![
            event(2, "Dina", General, LeaveRequest, at(14, "10:00")),
            event(1, "Dina", General, ClockIn, at(14, "08:00")),
        ];
        let out = aggregate_month(&events, OCTOBER, &roster, &ctx);
        let today = &out["Dina"].today;
        assert_eq!(today.status, DayStatus::Leave);
        assert_eq!(today.note.as_deref(), Some("keperluan keluarga"));
        assert_eq!(today.clock_in, hm("08:00"));
        let ids: Vec<_> = out["Dina"].logs.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[rstest]
    fn today_clock_times_only_come_from_today(
        roster: Vec<EmployeeProfile>,
        ctx: AggregationContext,
    ) {
        let events = vec![
            event(1, "Dina", General, ClockIn, at(13, "08:00")),
            event(2, "Dina", General, ClockOut, at(13, "17:00")),
            event(3, "Dina", General, ClockIn, at(14, "08:15")),
            event(4, "Dina", General, ClockOut, at(14, "16:45")),
        ];
        let out = aggregate_month(&events, OCTOBER, &roster, &ctx);
        let today = &out["Dina"].today;
        assert_eq!(today.status, DayStatus::Present);
        assert_eq!(today.clock_in, hm("08:15"));
        assert_eq!(today.clock_out, hm("16:45"));
        assert_eq!(out["Dina"].present_days, 2);
    }

    #[rstest]
    fn unknown_employee_is_ignored(roster: Vec<EmployeeProfile>, ctx: AggregationContext) {
        let events = vec![
            event(1, "Siti", General, ClockIn, at(5, "08:00")),
            event(2, "Siti", Live, ClockIn, at(5, "10:00")),
            event(3, "Siti", Live, ClockOut, at(5, "12:00")),
            event(4, "Dina", General, ClockIn, at(5, "08:00")),
        ];
        let out = aggregate_month(&events, OCTOBER, &roster, &ctx);
        assert!(!out.contains_key("Siti"));
        assert_eq!(out["Dina"].present_days, 1);
        assert_eq!(out["Dina"].live_hours, 0.0);
    }

    #[rstest]
    fn other_months_never_leak(roster: Vec<EmployeeProfile>, ctx: AggregationContext) {
        let mut september = event(1, "Dina", General, ClockIn, at(5, "08:00"));
        september.month_index = 8;
        let mut live_in = event(2, "Dina", Live, ClockIn, at(5, "10:00"));
        live_in.month_index = 8;
        let live_out = event(3, "Dina", Live, ClockOut, at(5, "12:00"));
        let out = aggregate_month(&[september, live_in, live_out], OCTOBER, &roster, &ctx);
        let dina = &out["Dina"];
        assert_eq!(dina.present_days, 0);
        assert_eq!(dina.live_hours, 0.0);
        assert_eq!(dina.unpaired_live_sessions, 0);
        assert_eq!(dina.logs.len(), 1);
    }

    #[rstest]
    fn running_twice_is_identical(roster: Vec<EmployeeProfile>, ctx: AggregationContext) {
        let events = vec![
            event(1, "Dina", Live, ClockIn, at(3, "10:07")),
            event(2, "Dina", Live, ClockOut, at(3, "13:41")),
            event(3, "Rudi", General, SickRequest, at(14, "07:00")),
            event(4, "Dina", Live, ClockIn, at(9, "19:13")),
            event(5, "Dina", Live, ClockOut, at(9, "21:02")),
        ];
        let first = aggregate_month(&events, OCTOBER, &roster, &ctx);
        let mut reversed = events.clone();
        reversed.reverse();
        let second = aggregate_month(&reversed, OCTOBER, &roster, &ctx);
        assert_eq!(first, second);
        assert_eq!(
            first["Dina"].live_pay.to_bits(),
            second["Dina"].live_pay.to_bits()
        );
    }

    #[rstest]
    fn hourly_rate_comes_from_context(roster: Vec<EmployeeProfile>, ctx: AggregationContext) {
        let events = vec![
            event(1, "Rudi", Live, ClockIn, at(2, "09:00")),
            event(2, "Rudi", Live, ClockOut, at(2, "11:00")),
        ];
        let out = aggregate_month(&events, OCTOBER, &roster, &ctx.with_hourly_rate(30_000.0));
        assert_eq!(out["Rudi"].live_pay, 60_000.0);
    }
}
