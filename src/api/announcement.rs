use actix_web::{HttpResponse, Responder, web};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::model::announcement::Announcement;
use crate::state::AppState;
use crate::utils::display::{tanggal_display, waktu};

#[derive(Deserialize, ToSchema)]
pub struct UpdateAnnouncement {
    #[schema(example = "Rapat bulanan hari Jumat jam 09:00")]
    pub text: String,
}

/// An empty board has empty text and no author.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AnnouncementResponse {
    pub text: String,
    pub updated_by: Option<String>,
    pub updated_at: Option<i64>,
    #[schema(example = "14/10/2026 09:15")]
    pub updated_display: Option<String>,
}

impl AnnouncementResponse {
    pub fn from_announcement(announcement: Option<Announcement>, offset: &FixedOffset) -> Self {
        match announcement {
            Some(a) => Self {
                updated_display: Some(format!(
                    "{} {}",
                    tanggal_display(a.updated_at, offset),
                    waktu(a.updated_at, offset)
                )),
                text: a.text,
                updated_by: Some(a.updated_by),
                updated_at: Some(a.updated_at),
            },
            None => Self {
                text: String::new(),
                updated_by: None,
                updated_at: None,
                updated_display: None,
            },
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/announcement",
    responses(
        (status = 200, description = "Current announcement", body = AnnouncementResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Announcement"
)]
pub async fn get_announcement(
    _auth: AuthUser,
    state: web::Data<AppState>,
) -> actix_web::Result<impl Responder> {
    let current = state.board.announcement().await?;
    Ok(HttpResponse::Ok().json(AnnouncementResponse::from_announcement(current, &state.offset)))
}

/// Replace the announcement (admin)
#[utoipa::path(
    put,
    path = "/api/announcement",
    request_body = UpdateAnnouncement,
    responses(
        (status = 200, description = "Announcement replaced", body = AnnouncementResponse),
        (status = 400, description = "Empty text"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Announcement"
)]
pub async fn update_announcement(
    auth: AuthUser,
    body: web::Json<UpdateAnnouncement>,
    state: web::Data<AppState>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let updated = state
        .board
        .update_announcement(&auth.display_name, &body.text)
        .await?;
    Ok(HttpResponse::Ok().json(AnnouncementResponse::from_announcement(
        Some(updated),
        &state.offset,
    )))
}
