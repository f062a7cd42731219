use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde_json::json;
use tracing::{debug, info, instrument};

use crate::{
    auth::{
        auth::{AuthUser, bearer_token},
        jwt::{generate_access_token, generate_refresh_token, verify_token},
    },
    config::Config,
    error::AppError,
    model::employee::EmployeeProfile,
    models::{ChangePasswordDto, LoginReqDto, LoginResponse, TokenType},
    state::AppState,
};

fn issue_tokens(profile: EmployeeProfile, config: &Config) -> Result<LoginResponse, AppError> {
    let access_token =
        generate_access_token(&profile, &config.jwt_secret, config.access_token_ttl)?;
    let (refresh_token, refresh_claims) =
        generate_refresh_token(&profile, &config.jwt_secret, config.refresh_token_ttl)?;
    debug!(jti = %refresh_claims.jti, "Issued token pair");

    Ok(LoginResponse {
        access_token,
        refresh_token,
        profile,
    })
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Username or password missing"),
        (status = 401, description = "Invalid credentials"),
        (status = 429, description = "Too many requests")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(state, config, user),
    fields(username = %user.username)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    state: web::Data<AppState>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    info!("Login request received");

    if user.username.trim().is_empty() || user.password.is_empty() {
        return Err(AppError::validation("Username or password required").into());
    }

    let profile = state
        .identity
        .resolve_login(&user.username, &user.password)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let response = issue_tokens(profile, &config)?;
    info!("Login successful");
    Ok(HttpResponse::Ok().json(response))
}

/// Exchanges a refresh token (sent as the bearer token) for a new pair.
#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "New token pair", body = LoginResponse),
        (status = 401, description = "Missing, invalid or non-refresh token")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn refresh_token(
    req: HttpRequest,
    state: web::Data<AppState>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    let token = bearer_token(&req).ok_or_else(|| AppError::Unauthorized("No token".to_string()))?;

    let claims = verify_token(token, &config.jwt_secret)
        .map_err(|_| AppError::Unauthorized("Invalid token".to_string()))?;
    if claims.token_type != TokenType::Refresh {
        return Err(AppError::Unauthorized("Refresh token required".to_string()).into());
    }

    // Role or name changes since the last login take effect here.
    let profile = state
        .roster
        .find(&claims.sub)
        .await
        .map_err(|_| AppError::Unauthorized("Account no longer exists".to_string()))?;

    Ok(HttpResponse::Ok().json(issue_tokens(profile, &config)?))
}

#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Current profile", body = EmployeeProfile),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn me(auth: AuthUser, state: web::Data<AppState>) -> actix_web::Result<impl Responder> {
    let profile = state.roster.find(&auth.username).await?;
    Ok(HttpResponse::Ok().json(profile))
}

#[utoipa::path(
    put,
    path = "/api/me/password",
    request_body = ChangePasswordDto,
    responses(
        (status = 200, description = "Password changed", body = Object, example = json!({
            "message": "Password changed"
        })),
        (status = 400, description = "New password too short"),
        (status = 401, description = "Current password is wrong")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn change_password(
    auth: AuthUser,
    body: web::Json<ChangePasswordDto>,
    state: web::Data<AppState>,
) -> actix_web::Result<impl Responder> {
    state
        .roster
        .change_password(&auth.username, &body.current_password, &body.new_password)
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Password changed" })))
}
