use crate::api::admin::AdminLogResponse;
use crate::api::announcement::{AnnouncementResponse, UpdateAnnouncement};
use crate::api::attendance::{AttendanceLogResponse, RecordRequest};
use crate::api::summary::{DailySummaryResponse, MonthlyReportResponse, MonthlySummaryResponse};
use crate::model::attendance::{AttendanceAction, EventPatch, SessionKind};
use crate::model::employee::{EmployeeProfile, NewEmployee};
use crate::model::role::Role;
use crate::model::summary::DayStatus;
use crate::models::{ChangePasswordDto, LoginReqDto, LoginResponse};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Absensi API",
        version = "1.0.0",
        description = r#"
## Attendance tracking service

Employees clock in and out of **General** (office) and **Live** (paid
hourly) sessions, file leave and sick requests, and read monthly
summaries computed from the raw attendance log.

### Key Features
- **Attendance**: one clock-in and one clock-out per session and day
- **Summaries**: present, leave and sick days, Live hours and pay, today's status
- **Administration**: log corrections, announcements, audit trail, roster
- **Realtime**: `GET /api/stream` emits a `change` event whenever data changes

### Security
All `/api` endpoints require a **JWT Bearer** access token from `/auth/login`.
Admin-only operations answer `403` for staff.

### Times
Timestamps are epoch milliseconds. `waktu` (HH:MM) and `tanggal_display`
(DD/MM/YYYY) are rendered in the service's configured UTC offset.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::me,
        crate::auth::handlers::change_password,

        crate::api::attendance::record,
        crate::api::attendance::list,
        crate::api::attendance::edit,
        crate::api::attendance::delete,

        crate::api::summary::monthly,
        crate::api::summary::daily,

        crate::api::announcement::get_announcement,
        crate::api::announcement::update_announcement,

        crate::api::admin::list_logs,

        crate::api::employee::list_employees,
        crate::api::employee::create_employee,

        crate::api::stream::changes
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            ChangePasswordDto,
            EmployeeProfile,
            NewEmployee,
            Role,
            SessionKind,
            AttendanceAction,
            DayStatus,
            RecordRequest,
            EventPatch,
            AttendanceLogResponse,
            MonthlySummaryResponse,
            MonthlyReportResponse,
            DailySummaryResponse,
            UpdateAnnouncement,
            AnnouncementResponse,
            AdminLogResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login, token refresh and the caller's profile"),
        (name = "Attendance", description = "Recording and correcting attendance logs"),
        (name = "Summary", description = "Monthly and daily reports"),
        (name = "Announcement", description = "The shared announcement board"),
        (name = "Admin", description = "Audit trail of admin changes"),
        (name = "Employee", description = "Roster management"),
        (name = "Realtime", description = "Change notifications"),
    )
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
