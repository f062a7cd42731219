//! Pairs Live clock-ins with their clock-outs.

use chrono::{FixedOffset, NaiveDate};

use super::MILLIS_PER_HOUR;
use super::calendar::local_date;
use crate::model::attendance::{AttendanceAction, AttendanceEvent, SessionKind};

#[derive(Debug, Clone, PartialEq)]
pub struct LiveSession<'a> {
    pub clock_in: &'a AttendanceEvent,
    pub clock_out: Option<&'a AttendanceEvent>,
    /// Local date of the clock-in.
    pub date: NaiveDate,
}

impl LiveSession<'_> {
    pub fn is_paired(&self) -> bool {
        self.clock_out.is_some()
    }

    pub fn hours(&self) -> f64 {
        match self.clock_out {
            Some(out) => (out.occurred_at - self.clock_in.occurred_at) as f64 / MILLIS_PER_HOUR,
            None => 0.0,
        }
    }
}

fn is_live(event: &AttendanceEvent, action: AttendanceAction) -> bool {
    event.session_kind == SessionKind::Live && event.action == action
}

/// Walks `sorted` (ascending by timestamp) and gives every Live clock-in the
/// first unclaimed Live clock-out of the same employee, on the same local
/// date, with a strictly later timestamp. A clock-out on the next date never
/// pairs. Each clock-out closes at most one session.
pub fn pair_live_sessions<'a>(
    sorted: &[&'a AttendanceEvent],
    offset: &FixedOffset,
) -> Vec<LiveSession<'a>> {
    let mut claimed = vec![false; sorted.len()];
    let mut sessions = Vec::new();

    for (idx, clock_in) in sorted.iter().copied().enumerate() {
        if !is_live(clock_in, AttendanceAction::ClockIn) {
            continue;
        }
        let Some(date) = local_date(clock_in.occurred_at, offset) else {
            continue;
        };

        let partner = sorted
            .iter()
            .copied()
            .enumerate()
            .skip(idx + 1)
            .find(|(j, candidate)| {
                !claimed.get(*j).copied().unwrap_or(true)
                    && is_live(candidate, AttendanceAction::ClockOut)
                    && candidate.employee_name == clock_in.employee_name
                    && candidate.occurred_at > clock_in.occurred_at
                    && local_date(candidate.occurred_at, offset) == Some(date)
            });

        if let Some((j, _)) = partner {
            if let Some(slot) = claimed.get_mut(j) {
                *slot = true;
            }
        }

        sessions.push(LiveSession {
            clock_in,
            clock_out: partner.map(|(_, out)| out),
            date,
        });
    }

    sessions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{at, event, wib};
    use crate::model::attendance::AttendanceAction::{ClockIn, ClockOut};
    use crate::model::attendance::SessionKind::{General, Live};

    #[test]
    fn pairs_with_first_later_clock_out() {
        let events = vec![
            event(1, "Dina", Live, ClockIn, at(5, "10:00")),
            event(2, "Dina", Live, ClockOut, at(5, "14:30")),
        ];
        let sorted: Vec<_> = events.iter().collect();
        let sessions = pair_live_sessions(&sorted, &wib());
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].clock_out.map(|e| e.id), Some(2));
        assert_eq!(sessions[0].hours(), 4.5);
    }

    #[test]
    fn ignores_other_employees_and_general_clock_outs() {
        let events = vec![
            event(1, "Dina", Live, ClockIn, at(5, "10:00")),
            event(2, "Rudi", Live, ClockOut, at(5, "11:00")),
            event(3, "Dina", General, ClockOut, at(5, "12:00")),
        ];
        let sorted: Vec<_> = events.iter().collect();
        let sessions = pair_live_sessions(&sorted, &wib());
        assert_eq!(sessions.len(), 1);
        assert!(!sessions[0].is_paired());
        assert_eq!(sessions[0].hours(), 0.0);
    }

    #[test]
    fn overlapping_sessions_pair_greedily() {
        let events = vec![
            event(1, "Dina", Live, ClockIn, at(5, "09:00")),
            event(2, "Dina", Live, ClockIn, at(5, "10:00")),
            event(3, "Dina", Live, ClockOut, at(5, "11:00")),
            event(4, "Dina", Live, ClockOut, at(5, "13:00")),
        ];
        let sorted: Vec<_> = events.iter().collect();
        let sessions = pair_live_sessions(&sorted, &wib());
        let pairs: Vec<_> = sessions
            .iter()
            .map(|s| (s.clock_in.id, s.clock_out.map(|e| e.id)))
            .collect();
        assert_eq!(pairs, vec![(1, Some(3)), (2, Some(4))]);
    }

    #[test]
    fn clock_out_after_midnight_stays_unpaired() {
        let events = vec![
            event(1, "Dina", Live, ClockIn, at(5, "23:50")),
            event(2, "Dina", Live, ClockOut, at(6, "00:10")),
        ];
        let sorted: Vec<_> = events.iter().collect();
        let sessions = pair_live_sessions(&sorted, &wib());
        assert_eq!(sessions.len(), 1);
        assert!(sessions[0].clock_out.is_none());
    }
}
