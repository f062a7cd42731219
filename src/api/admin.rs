use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::state::AppState;
use crate::utils::display::{tanggal_display, waktu};

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AdminLogQuery {
    /// At most 100
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdminLogResponse {
    pub id: u64,
    #[schema(example = "Admin")]
    pub admin: String,
    /// What was done
    #[schema(example = "Deleted log #12 of Dina (general clock_in)")]
    pub aksi: String,
    pub timestamp: i64,
    #[schema(example = "09:15")]
    pub waktu: String,
    #[schema(example = "14/10/2026")]
    pub tanggal_display: String,
}

/// Audit trail of admin changes, newest first (admin)
#[utoipa::path(
    get,
    path = "/api/admin/logs",
    params(AdminLogQuery),
    responses(
        (status = 200, description = "Admin log entries", body = Vec<AdminLogResponse>),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn list_logs(
    auth: AuthUser,
    query: web::Query<AdminLogQuery>,
    state: web::Data<AppState>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let logs: Vec<AdminLogResponse> = state
        .board
        .admin_logs(query.limit)
        .await?
        .into_iter()
        .map(|log| AdminLogResponse {
            waktu: waktu(log.occurred_at, &state.offset),
            tanggal_display: tanggal_display(log.occurred_at, &state.offset),
            id: log.id,
            admin: log.admin,
            aksi: log.action,
            timestamp: log.occurred_at,
        })
        .collect();
    Ok(HttpResponse::Ok().json(logs))
}
