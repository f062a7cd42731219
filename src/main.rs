use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod engine;
mod error;
mod model;
mod models;
mod notifier;
mod routes;
mod service;
mod state;
mod store;
mod utils;

use config::Config;
use db::init_db;
use routes::RateLimits;
use state::AppState;
use store::{MemoryStore, MySqlStore};

use crate::docs::ApiDoc;
use crate::utils::clock::{Clock, SystemClock};
use tracing::{info, warn};
use tracing_appender::rolling;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi; // needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Absensi is running"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "absensi.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();

    info!("Server starting...");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let state = match &config.database_url {
        Some(url) => {
            let pool = init_db(url).await?;
            AppState::from_store(
                Arc::new(MySqlStore::new(pool, config.utc_offset)),
                clock,
                &config,
            )
        }
        None => {
            warn!("DATABASE_URL not set, using the in-memory store; data is lost on restart");
            AppState::from_store(Arc::new(MemoryStore::new(config.utc_offset)), clock, &config)
        }
    };

    if let Some(admin) = &config.bootstrap_admin {
        state.roster.ensure_admin(admin).await?;
    }

    // Cached reports are dropped whenever the store changes.
    let _cache_invalidation = state.watch_store();

    let limits = RateLimits::from_config(&config)?;
    let server_addr = config.server_addr.clone();
    let state_data = Data::new(state);
    let config_data = Data::new(config);

    info!(addr = %server_addr, "Listening");

    HttpServer::new(move || {
        let config = config_data.clone();
        let limits = limits.clone();
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard {_:.*} matches the JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(state_data.clone())
            .app_data(config.clone())
            .service(index)
            // Configure auth + protected routes with rate limiting
            .configure(move |cfg| routes::configure(cfg, &config, &limits))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
