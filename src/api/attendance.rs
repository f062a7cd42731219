use actix_web::{HttpResponse, Responder, web};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::PeriodQuery;
use crate::auth::auth::AuthUser;
use crate::engine::calendar::month_window;
use crate::error::AppError;
use crate::model::attendance::{AttendanceAction, AttendanceEvent, EventPatch, SessionKind};
use crate::state::AppState;
use crate::utils::display::{tanggal_display, waktu};

#[derive(Deserialize, ToSchema)]
pub struct RecordRequest {
    pub session_kind: SessionKind,
    pub action: AttendanceAction,
    /// Required for leave and sick requests
    #[schema(example = "Acara keluarga")]
    pub note: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AttendanceLogResponse {
    #[schema(example = 42)]
    pub id: u64,
    #[schema(example = "Dina")]
    pub employee_name: String,
    pub session_kind: SessionKind,
    pub action: AttendanceAction,
    pub note: Option<String>,
    #[schema(example = 1760410800000_i64)]
    pub timestamp: i64,
    #[schema(example = 9)]
    pub month_index: u32,
    pub is_edited: bool,
    #[schema(example = "08:00")]
    pub waktu: String,
    #[schema(example = "14/10/2026")]
    pub tanggal_display: String,
}

impl AttendanceLogResponse {
    pub fn from_event(event: &AttendanceEvent, offset: &FixedOffset) -> Self {
        Self {
            id: event.id,
            employee_name: event.employee_name.clone(),
            session_kind: event.session_kind,
            action: event.action,
            note: event.note.clone(),
            timestamp: event.occurred_at,
            month_index: event.month_index,
            is_edited: event.is_edited,
            waktu: waktu(event.occurred_at, offset),
            tanggal_display: tanggal_display(event.occurred_at, offset),
        }
    }
}

/// Record an attendance action for the caller at the current time
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = RecordRequest,
    responses(
        (status = 201, description = "Recorded", body = AttendanceLogResponse),
        (status = 400, description = "Duplicate, missing note, outside the clock-in window or session not permitted", body = Object, example = json!({
            "error": "This action was already recorded today for that session"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Store unavailable")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn record(
    auth: AuthUser,
    body: web::Json<RecordRequest>,
    state: web::Data<AppState>,
) -> actix_web::Result<impl Responder> {
    let body = body.into_inner();
    let event = state
        .attendance
        .record(&auth.username, body.session_kind, body.action, body.note)
        .await?;
    Ok(HttpResponse::Created().json(AttendanceLogResponse::from_event(&event, &state.offset)))
}

/// List attendance logs of one month, oldest first
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(PeriodQuery),
    responses(
        (status = 200, description = "Logs", body = Vec<AttendanceLogResponse>),
        (status = 400, description = "Invalid month"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Staff asking for someone else's logs")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn list(
    auth: AuthUser,
    query: web::Query<PeriodQuery>,
    state: web::Data<AppState>,
) -> actix_web::Result<impl Responder> {
    let query = query.into_inner();
    let period = query.period(&state)?;
    let employee = auth.scope_to(query.employee.clone())?;
    let window = month_window(period.year, period.month_index, &state.offset)
        .ok_or_else(|| AppError::validation("Unsupported year or month"))?;

    let logs: Vec<AttendanceLogResponse> = state
        .attendance
        .list(Some(window), employee.as_deref())
        .await?
        .iter()
        .filter(|e| query.session.is_none_or(|kind| e.session_kind == kind))
        .map(|e| AttendanceLogResponse::from_event(e, &state.offset))
        .collect();
    Ok(HttpResponse::Ok().json(logs))
}

/// Correct an attendance log (admin)
#[utoipa::path(
    patch,
    path = "/api/attendance/{id}",
    params(
        ("id" = u64, Path, description = "Attendance log id")
    ),
    request_body = EventPatch,
    responses(
        (status = 200, description = "Updated", body = AttendanceLogResponse),
        (status = 400, description = "Empty patch or conflicting log"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Log not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn edit(
    auth: AuthUser,
    path: web::Path<u64>,
    body: web::Json<EventPatch>,
    state: web::Data<AppState>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let event = state
        .attendance
        .edit(&auth.display_name, path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(AttendanceLogResponse::from_event(&event, &state.offset)))
}

/// Delete an attendance log (admin)
#[utoipa::path(
    delete,
    path = "/api/attendance/{id}",
    params(
        ("id" = u64, Path, description = "Attendance log id")
    ),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Log not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn delete(
    auth: AuthUser,
    path: web::Path<u64>,
    state: web::Data<AppState>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    state
        .attendance
        .delete(&auth.display_name, path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
