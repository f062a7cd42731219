use std::env;
use std::str::FromStr;

use chrono::{FixedOffset, NaiveTime};
use dotenvy::dotenv;

use crate::engine::{LIVE_HOURLY_RATE, calendar::parse_offset};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub username: String,
    pub password: String,
    pub display_name: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// `None` runs against the in-memory store.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_refresh_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    /// Offset used for calendar dates, "today" and display strings.
    pub utc_offset: FixedOffset,
    pub live_hourly_rate: f64,
    pub clock_in_opens: NaiveTime,
    pub clock_in_closes: NaiveTime,

    pub log_dir: String,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &'static str| lookup(key).filter(|v| !v.trim().is_empty());

        let parsed = |key: &'static str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        let bootstrap_admin = match (
            var("BOOTSTRAP_ADMIN_USERNAME"),
            var("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Some(username), Some(password)) => Some(BootstrapAdmin {
                display_name: var("BOOTSTRAP_ADMIN_NAME").unwrap_or_else(|| username.clone()),
                username,
                password,
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing("BOOTSTRAP_ADMIN_PASSWORD")),
            (None, Some(_)) => return Err(ConfigError::Missing("BOOTSTRAP_ADMIN_USERNAME")),
        };

        let offset_raw = parsed("UTC_OFFSET", "+07:00");
        let utc_offset = parse_offset(&offset_raw).ok_or(ConfigError::Invalid {
            key: "UTC_OFFSET",
            value: offset_raw.clone(),
        })?;

        let clock_in_opens = parse_time("CLOCK_IN_OPENS", &parsed("CLOCK_IN_OPENS", "05:00"))?;
        let clock_in_closes =
            parse_time("CLOCK_IN_CLOSES", &parsed("CLOCK_IN_CLOSES", "21:00"))?;
        if clock_in_opens >= clock_in_closes {
            return Err(ConfigError::Invalid {
                key: "CLOCK_IN_CLOSES",
                value: clock_in_closes.format("%H:%M").to_string(),
            });
        }

        Ok(Self {
            server_addr: parsed("SERVER_ADDR", "0.0.0.0:8080"),
            database_url: var("DATABASE_URL"),
            jwt_secret: var("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?,
            access_token_ttl: parse_num("ACCESS_TOKEN_TTL", &parsed("ACCESS_TOKEN_TTL", "900"))?, // default 15 min
            refresh_token_ttl: parse_num(
                "REFRESH_TOKEN_TTL",
                &parsed("REFRESH_TOKEN_TTL", "604800"), // default 7 days
            )?,

            rate_login_per_min: parse_num("RATE_LOGIN_PER_MIN", &parsed("RATE_LOGIN_PER_MIN", "60"))?,
            rate_refresh_per_min: parse_num(
                "RATE_REFRESH_PER_MIN",
                &parsed("RATE_REFRESH_PER_MIN", "30"),
            )?,
            rate_protected_per_min: parse_num(
                "RATE_PROTECTED_PER_MIN",
                &parsed("RATE_PROTECTED_PER_MIN", "1000"),
            )?,

            api_prefix: parsed("API_PREFIX", "/api"),

            utc_offset,
            live_hourly_rate: parse_rate(
                "LIVE_HOURLY_RATE",
                &parsed("LIVE_HOURLY_RATE", &LIVE_HOURLY_RATE.to_string()),
            )?,
            clock_in_opens,
            clock_in_closes,

            log_dir: parsed("LOG_DIR", "logs"),
            bootstrap_admin,
        })
    }
}

fn parse_num<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: raw.to_string(),
    })
}

/// A finite, non-negative amount.
fn parse_rate(key: &'static str, raw: &str) -> Result<f64, ConfigError> {
    let rate: f64 = parse_num(key, raw)?;
    if !rate.is_finite() || rate < 0.0 {
        return Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
        });
    }
    Ok(rate)
}

fn parse_time(key: &'static str, raw: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").map_err(|_| ConfigError::Invalid {
        key,
        value: raw.to_string(),
    })
}
