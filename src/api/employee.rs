use actix_web::{HttpResponse, Responder, web};

use crate::auth::auth::AuthUser;
use crate::model::employee::{EmployeeProfile, NewEmployee};
use crate::state::AppState;

/// List the roster (admin)
#[utoipa::path(
    get,
    path = "/api/employees",
    responses(
        (status = 200, description = "All employee profiles", body = Vec<EmployeeProfile>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Employee"
)]
pub async fn list_employees(
    auth: AuthUser,
    state: web::Data<AppState>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let profiles = state.roster.list().await?;
    Ok(HttpResponse::Ok().json(profiles))
}

/// Create an employee with login credentials (admin)
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = NewEmployee,
    responses(
        (status = 201, description = "Employee created", body = EmployeeProfile),
        (status = 400, description = "Invalid input or username taken", body = Object, example = json!({
            "error": "Username or display name already taken"
        })),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Employee"
)]
pub async fn create_employee(
    auth: AuthUser,
    body: web::Json<NewEmployee>,
    state: web::Data<AppState>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let profile = state.roster.create(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(profile))
}
