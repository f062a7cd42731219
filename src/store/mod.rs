//! Persistence ports and their MySQL and in-memory adapters.
//!
//! Stores own the once-per-day rule for clock-ins and clock-outs: a second
//! write with the same dedupe key is rejected atomically, whatever the
//! caller checked beforehand.

pub mod memory;
pub mod mysql;

use async_trait::async_trait;
use chrono::FixedOffset;

use crate::engine::calendar::{local_date, month_index_of};
use crate::error::{AppError, AppResult};
use crate::model::admin_log::{AdminLog, NewAdminLog};
use crate::model::announcement::Announcement;
use crate::model::attendance::{AttendanceEvent, EventPatch, NewAttendanceEvent, SessionKind};
use crate::model::attendance::{AttendanceAction, TimeWindow};
use crate::model::employee::{Credentials, EmployeeProfile, NewEmployee};

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

pub const DUPLICATE_ACTION: &str = "This action was already recorded today for that session";
pub const USERNAME_TAKEN: &str = "Username or display name already taken";

#[async_trait]
pub trait EventStore: Send + Sync {
    /// Events inside `window` (everything when `None`), oldest first.
    async fn list_events(&self, window: Option<TimeWindow>) -> AppResult<Vec<AttendanceEvent>>;

    async fn get_event(&self, id: u64) -> AppResult<Option<AttendanceEvent>>;

    async fn append_event(&self, event: NewAttendanceEvent) -> AppResult<AttendanceEvent>;

    /// Applies an admin correction and marks the event edited.
    async fn update_event(&self, id: u64, patch: EventPatch) -> AppResult<AttendanceEvent>;

    async fn delete_event(&self, id: u64) -> AppResult<()>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn find_credentials(&self, username: &str) -> AppResult<Option<Credentials>>;

    async fn list_profiles(&self) -> AppResult<Vec<EmployeeProfile>>;

    async fn create_profile(
        &self,
        employee: &NewEmployee,
        password_hash: &str,
        created_at: i64,
    ) -> AppResult<EmployeeProfile>;

    async fn update_password(
        &self,
        username: &str,
        password_hash: &str,
        updated_at: i64,
    ) -> AppResult<()>;
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn announcement(&self) -> AppResult<Option<Announcement>>;

    /// Replaces the current announcement.
    async fn put_announcement(&self, announcement: Announcement) -> AppResult<Announcement>;

    async fn append_admin_log(&self, entry: NewAdminLog) -> AppResult<AdminLog>;

    /// Newest first.
    async fn list_admin_logs(&self, limit: u32) -> AppResult<Vec<AdminLog>>;
}

/// Key shared by events that may only happen once per employee, session and
/// local day. `None` for actions without that limit.
pub fn dedupe_key(
    employee_name: &str,
    session_kind: SessionKind,
    action: AttendanceAction,
    occurred_at: i64,
    offset: &FixedOffset,
) -> Option<String> {
    if !action.is_once_per_day() {
        return None;
    }
    let date = local_date(occurred_at, offset)?;
    Some(format!("{employee_name}|{session_kind}|{action}|{date}"))
}

pub fn event_dedupe_key(event: &AttendanceEvent, offset: &FixedOffset) -> Option<String> {
    dedupe_key(
        &event.employee_name,
        event.session_kind,
        event.action,
        event.occurred_at,
        offset,
    )
}

/// Applies `patch` in place, re-deriving `month_index`.
pub fn apply_patch(
    event: &mut AttendanceEvent,
    patch: EventPatch,
    offset: &FixedOffset,
) -> AppResult<()> {
    if let Some(action) = patch.action {
        event.action = action;
    }
    if let Some(occurred_at) = patch.occurred_at {
        event.month_index = month_index_of(occurred_at, offset)
            .ok_or_else(|| AppError::validation("Timestamp out of range"))?;
        event.occurred_at = occurred_at;
    }
    if let Some(note) = patch.note {
        let note = note.trim();
        event.note = (!note.is_empty()).then(|| note.to_string());
    }
    if event.action.requires_note() && event.note.is_none() {
        return Err(AppError::validation("A reason is required for leave and sick requests"));
    }
    event.is_edited = true;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{at, event, wib};
    use crate::model::attendance::AttendanceAction::{ClockIn, LeaveRequest};
    use crate::model::attendance::SessionKind::Live;

    #[test]
    fn dedupe_key_is_per_local_day() {
        let morning = dedupe_key("Dina", Live, ClockIn, at(5, "00:30"), &wib());
        let evening = dedupe_key("Dina", Live, ClockIn, at(5, "23:30"), &wib());
        let next = dedupe_key("Dina", Live, ClockIn, at(6, "00:30"), &wib());
        assert_eq!(morning.as_deref(), Some("Dina|live|clock_in|2026-10-05"));
        assert_eq!(morning, evening);
        assert_ne!(morning, next);
        assert!(dedupe_key("Dina", Live, LeaveRequest, at(5, "08:00"), &wib()).is_none());
    }

    #[test]
    fn patch_moves_event_between_months() {
        let mut e = event(1, "Dina", Live, ClockIn, at(1, "10:00"));
        let patch = EventPatch {
            occurred_at: Some(at(1, "10:00") - 2 * 86_400_000),
            ..EventPatch::default()
        };
        apply_patch(&mut e, patch, &wib()).unwrap();
        assert_eq!(e.month_index, 8);
        assert!(e.is_edited);
    }

    #[test]
    fn patch_to_leave_needs_a_note() {
        let mut e = event(1, "Dina", Live, ClockIn, at(1, "10:00"));
        let patch = EventPatch {
            action: Some(LeaveRequest),
            note: Some("   ".into()),
            ..EventPatch::default()
        };
        assert!(matches!(
            apply_patch(&mut e, patch, &wib()),
            Err(AppError::Validation(_))
        ));
    }
}
