use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// The two independent attendance tracks an employee can be authorized for.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize, Display,
    EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SessionKind {
    General,
    Live,
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttendanceAction {
    ClockIn,
    ClockOut,
    LeaveRequest,
    SickRequest,
}

impl AttendanceAction {
    /// Leave and sick requests must carry a reason.
    pub fn requires_note(&self) -> bool {
        matches!(self, AttendanceAction::LeaveRequest | AttendanceAction::SickRequest)
    }

    /// Actions limited to one occurrence per employee, session and day.
    pub fn is_once_per_day(&self) -> bool {
        matches!(self, AttendanceAction::ClockIn | AttendanceAction::ClockOut)
    }
}

/// A persisted attendance fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceEvent {
    pub id: u64,
    pub employee_name: String,
    pub session_kind: SessionKind,
    pub action: AttendanceAction,
    pub note: Option<String>,
    /// Epoch milliseconds.
    pub occurred_at: i64,
    /// 0-11, derived from `occurred_at` when written.
    pub month_index: u32,
    pub is_edited: bool,
}

/// An event as submitted to a store, before it has an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAttendanceEvent {
    pub employee_name: String,
    pub session_kind: SessionKind,
    pub action: AttendanceAction,
    pub note: Option<String>,
    pub occurred_at: i64,
    pub month_index: u32,
}

impl NewAttendanceEvent {
    pub fn into_event(self, id: u64) -> AttendanceEvent {
        AttendanceEvent {
            id,
            employee_name: self.employee_name,
            session_kind: self.session_kind,
            action: self.action,
            note: self.note,
            occurred_at: self.occurred_at,
            month_index: self.month_index,
            is_edited: false,
        }
    }
}

/// Admin correction of an existing event. `month_index` is recomputed by
/// the store when `occurred_at` changes.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, ToSchema)]
pub struct EventPatch {
    pub action: Option<AttendanceAction>,
    #[schema(example = 1760410800000_i64)]
    pub occurred_at: Option<i64>,
    pub note: Option<String>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        self.action.is_none() && self.occurred_at.is_none() && self.note.is_none()
    }
}

/// Inclusive-exclusive range of epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: i64,
    pub end: i64,
}

impl TimeWindow {
    pub fn contains(&self, millis: i64) -> bool {
        millis >= self.start && millis < self.end
    }
}
