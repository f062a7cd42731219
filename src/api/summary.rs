use actix_web::{HttpResponse, Responder, web};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::PeriodQuery;
use super::attendance::AttendanceLogResponse;
use crate::auth::auth::AuthUser;
use crate::model::summary::{DailySummary, DayStatus, MonthlySummary};
use crate::state::AppState;
use crate::utils::display::clock_label;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MonthlySummaryResponse {
    #[schema(example = "Dina")]
    pub employee_name: String,
    #[schema(example = 18)]
    pub present_days: u32,
    #[schema(example = 1)]
    pub leave_days: u32,
    #[schema(example = 0)]
    pub sick_days: u32,
    #[schema(example = 4.5)]
    pub live_hours: f64,
    #[schema(example = 112500.0)]
    pub live_pay: f64,
    /// Live clock-ins still waiting for a clock-out
    pub unpaired_live_sessions: u32,
    pub today_status: DayStatus,
    #[schema(example = "08:00")]
    pub today_clock_in: String,
    #[schema(example = "--:--")]
    pub today_clock_out: String,
    pub today_note: Option<String>,
    pub logs: Vec<AttendanceLogResponse>,
}

impl MonthlySummaryResponse {
    pub fn from_summary(summary: &MonthlySummary, offset: &FixedOffset) -> Self {
        Self {
            employee_name: summary.employee_name.clone(),
            present_days: summary.present_days,
            leave_days: summary.leave_days,
            sick_days: summary.sick_days,
            live_hours: summary.live_hours,
            live_pay: summary.live_pay,
            unpaired_live_sessions: summary.unpaired_live_sessions,
            today_status: summary.today.status,
            today_clock_in: clock_label(summary.today.clock_in),
            today_clock_out: clock_label(summary.today.clock_out),
            today_note: summary.today.note.clone(),
            logs: summary
                .logs
                .iter()
                .map(|e| AttendanceLogResponse::from_event(e, offset))
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MonthlyReportResponse {
    #[schema(example = 2026)]
    pub year: i32,
    /// 1-12
    #[schema(example = 10)]
    pub month: u32,
    pub summaries: Vec<MonthlySummaryResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DailySummaryResponse {
    #[schema(example = "2026-10-14")]
    pub date: String,
    #[schema(example = "14/10/2026")]
    pub tanggal_display: String,
    #[schema(example = "08:00")]
    pub clock_in: String,
    #[schema(example = "17:05")]
    pub clock_out: String,
    pub status: DayStatus,
    pub note: Option<String>,
    #[schema(example = 0.0)]
    pub live_hours: f64,
}

impl From<&DailySummary> for DailySummaryResponse {
    fn from(day: &DailySummary) -> Self {
        Self {
            date: day.date.format("%Y-%m-%d").to_string(),
            tanggal_display: day.date.format("%d/%m/%Y").to_string(),
            clock_in: clock_label(day.clock_in),
            clock_out: clock_label(day.clock_out),
            status: day.status,
            note: day.note.clone(),
            live_hours: day.live_hours,
        }
    }
}

/// Monthly summaries: the whole roster for admins, the caller's own row for staff
#[utoipa::path(
    get,
    path = "/api/summary",
    params(PeriodQuery),
    responses(
        (status = 200, description = "Monthly report", body = MonthlyReportResponse),
        (status = 400, description = "Invalid month"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Staff asking for someone else's summary")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Summary"
)]
pub async fn monthly(
    auth: AuthUser,
    query: web::Query<PeriodQuery>,
    state: web::Data<AppState>,
) -> actix_web::Result<impl Responder> {
    let period = query.period(&state)?;
    let employee = auth.scope_to(query.employee.clone())?;
    let report = state.reports.monthly(period).await?;

    let summaries = report
        .values()
        .filter(|s| employee.as_ref().is_none_or(|name| &s.employee_name == name))
        .map(|s| MonthlySummaryResponse::from_summary(s, &state.offset))
        .collect();

    Ok(HttpResponse::Ok().json(MonthlyReportResponse {
        year: period.year,
        month: period.month_index + 1,
        summaries,
    }))
}

/// Day-by-day breakdown of one employee's month
#[utoipa::path(
    get,
    path = "/api/summary/daily",
    params(PeriodQuery),
    responses(
        (status = 200, description = "One row per active day", body = Vec<DailySummaryResponse>),
        (status = 400, description = "Invalid month"),
        (status = 403, description = "Staff asking for someone else's days")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Summary"
)]
pub async fn daily(
    auth: AuthUser,
    query: web::Query<PeriodQuery>,
    state: web::Data<AppState>,
) -> actix_web::Result<impl Responder> {
    let period = query.period(&state)?;
    let employee = auth
        .scope_to(query.employee.clone())?
        .unwrap_or_else(|| auth.display_name.clone());

    let rows: Vec<DailySummaryResponse> = state
        .reports
        .daily(period, &employee)
        .await?
        .iter()
        .map(DailySummaryResponse::from)
        .collect();
    Ok(HttpResponse::Ok().json(rows))
}
