//! Application configuration loaded from environment variables.
//!
//! Read once at startup; the resulting quota policy is shared read-only.

use std::collections::HashMap;
use std::env;

use chrono::{Duration, Utc};
use thiserror::Error;

use dolle_core::domain::{
    DEFAULT_SERVER_LIMIT, DEFAULT_USER_LIMIT, DEFAULT_WINDOW_SECS, QuotaPolicy, WindowConfig,
    WindowRollover,
};

#[cfg(feature = "postgres")]
use dolle_infra::database::DatabaseConfig;
#[cfg(feature = "openai")]
use dolle_infra::OpenAiConfig;
#[cfg(feature = "redis")]
use dolle_infra::RedisConfig;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: '{value}' is not a valid number")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{var}: malformed override '{entry}' (expected id=limit)")]
    InvalidOverride { var: &'static str, entry: String },

    #[error("RATE_LIMIT_ROLLOVER: {0}")]
    InvalidRollover(String),

    #[error("RATE_LIMIT_WINDOW_SECS must be positive")]
    EmptyWindow,

    #[error("RATE_LIMIT_WINDOW_SECS: {0} seconds is too long")]
    WindowTooLong(i64),
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub policy: QuotaPolicy,
    pub window: WindowConfig,
    #[cfg(feature = "postgres")]
    pub database: Option<DatabaseConfig>,
    #[cfg(feature = "redis")]
    pub redis: Option<RedisConfig>,
    #[cfg(feature = "openai")]
    pub openai: Option<OpenAiConfig>,
    pub relay_webhook_url: Option<String>,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let lookup = |key: &str| env::var(key).ok();

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_number(&lookup, "PORT", 8080)?,
            policy: quota_policy(&lookup)?,
            window: window_config(&lookup)?,
            #[cfg(feature = "postgres")]
            database: DatabaseConfig::from_env(),
            #[cfg(feature = "redis")]
            redis: env::var("REDIS_URL").ok().map(|_| RedisConfig::from_env()),
            #[cfg(feature = "openai")]
            openai: OpenAiConfig::from_env(),
            relay_webhook_url: env::var("RELAY_WEBHOOK_URL").ok(),
        })
    }
}

/// Default limits plus overrides from `USER_LIMIT_OVERRIDES` and
/// `SERVER_LIMIT_OVERRIDES`.
fn quota_policy(lookup: &impl Fn(&str) -> Option<String>) -> Result<QuotaPolicy, ConfigError> {
    let mut policy = QuotaPolicy::new(
        parse_number(lookup, "DEFAULT_USER_LIMIT", DEFAULT_USER_LIMIT)?,
        parse_number(lookup, "DEFAULT_SERVER_LIMIT", DEFAULT_SERVER_LIMIT)?,
    );
    if let Some(raw) = lookup("USER_LIMIT_OVERRIDES") {
        policy.user_overrides = parse_overrides("USER_LIMIT_OVERRIDES", &raw)?;
    }
    if let Some(raw) = lookup("SERVER_LIMIT_OVERRIDES") {
        policy.server_overrides = parse_overrides("SERVER_LIMIT_OVERRIDES", &raw)?;
    }
    Ok(policy)
}

fn window_config(lookup: &impl Fn(&str) -> Option<String>) -> Result<WindowConfig, ConfigError> {
    let secs: i64 = parse_number(lookup, "RATE_LIMIT_WINDOW_SECS", DEFAULT_WINDOW_SECS)?;
    if secs <= 0 {
        return Err(ConfigError::EmptyWindow);
    }
    let length = Duration::try_seconds(secs)
        .filter(|length| Utc::now().checked_add_signed(*length).is_some())
        .ok_or(ConfigError::WindowTooLong(secs))?;
    let rollover = match lookup("RATE_LIMIT_ROLLOVER") {
        Some(raw) => raw
            .parse::<WindowRollover>()
            .map_err(ConfigError::InvalidRollover)?,
        None => WindowRollover::default(),
    };

    Ok(WindowConfig { length, rollover })
}

/// Parse `id=limit,id=limit`. Blank entries are skipped.
pub fn parse_overrides(var: &'static str, raw: &str) -> Result<HashMap<String, u64>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let invalid = || ConfigError::InvalidOverride {
                var,
                entry: entry.to_string(),
            };
            let (id, limit) = entry.split_once('=').ok_or_else(invalid)?;
            let id = id.trim();
            if id.is_empty() {
                return Err(invalid());
            }
            let limit = limit.trim().parse::<u64>().map_err(|_| invalid())?;
            Ok((id.to_string(), limit))
        })
        .collect()
}

fn parse_number<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { var, value }),
        None => Ok(default),
    }
}
