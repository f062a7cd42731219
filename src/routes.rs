use crate::{
    api::{admin, announcement, attendance, employee, stream, summary},
    auth::{handlers, middleware::auth_middleware},
    config::{Config, ConfigError},
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

type LimiterConfig = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-peer-IP limiters. Built once and shared by every worker so the
/// quotas are process wide.
#[derive(Clone)]
pub struct RateLimits {
    pub login: LimiterConfig,
    pub refresh: LimiterConfig,
    pub protected: LimiterConfig,
}

impl RateLimits {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            login: build_limiter("RATE_LOGIN_PER_MIN", config.rate_login_per_min)?,
            refresh: build_limiter("RATE_REFRESH_PER_MIN", config.rate_refresh_per_min)?,
            protected: build_limiter("RATE_PROTECTED_PER_MIN", config.rate_protected_per_min)?,
        })
    }
}

fn build_limiter(key: &'static str, requests_per_min: u32) -> Result<LimiterConfig, ConfigError> {
    let invalid = || ConfigError::Invalid {
        key,
        value: requests_per_min.to_string(),
    };
    if requests_per_min == 0 {
        return Err(invalid());
    }
    let per_ms = (60_000 / u64::from(requests_per_min)).max(1);
    GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(invalid)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limits: &RateLimits) {
    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(Governor::new(&limits.login))
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(Governor::new(&limits.refresh))
                    .route(web::post().to(handlers::refresh_token)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(Governor::new(&limits.protected)) // rate limiting
            .service(web::resource("/me").route(web::get().to(handlers::me)))
            .service(web::resource("/me/password").route(web::put().to(handlers::change_password)))
            .service(
                web::scope("/attendance")
                    // /attendance
                    .service(
                        web::resource("")
                            .route(web::post().to(attendance::record))
                            .route(web::get().to(attendance::list)),
                    )
                    // /attendance/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::patch().to(attendance::edit))
                            .route(web::delete().to(attendance::delete)),
                    ),
            )
            .service(
                web::scope("/summary")
                    .service(web::resource("").route(web::get().to(summary::monthly)))
                    .service(web::resource("/daily").route(web::get().to(summary::daily))),
            )
            .service(
                web::resource("/announcement")
                    .route(web::get().to(announcement::get_announcement))
                    .route(web::put().to(announcement::update_announcement)),
            )
            .service(web::resource("/admin/logs").route(web::get().to(admin::list_logs)))
            .service(
                web::resource("/employees")
                    .route(web::get().to(employee::list_employees))
                    .route(web::post().to(employee::create_employee)),
            )
            .service(web::resource("/stream").route(web::get().to(stream::changes))),
    );
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)

// API REQUEST
//  └─ Authorization: Bearer access_token

// ACCESS EXPIRED
//  └─ POST /auth/refresh with Authorization: Bearer refresh_token
//       └─ returns a new token pair
