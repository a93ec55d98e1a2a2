use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can drive it with a
/// plain `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    fn parse_as<T>(var: &str, raw: &str) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        raw.trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    }

    let database_url = require("DATABASE_URL")?;
    let password_pepper = require("SAFEWAY_PASSWORD_PEPPER")?;

    let env = parse_environment(&or_default("SAFEWAY_ENV", "development"))?;

    let bind_addr: SocketAddr = parse_as(
        "SAFEWAY_BIND_ADDR",
        &or_default("SAFEWAY_BIND_ADDR", "0.0.0.0:3000"),
    )?;
    let log_level = or_default("SAFEWAY_LOG_LEVEL", "info");
    let scoring_policy_path = PathBuf::from(or_default(
        "SAFEWAY_SCORING_POLICY_PATH",
        "./config/scoring.yaml",
    ));

    let session_ttl_hours: u64 = parse_as(
        "SAFEWAY_SESSION_TTL_HOURS",
        &or_default("SAFEWAY_SESSION_TTL_HOURS", "720"),
    )?;
    if session_ttl_hours == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "SAFEWAY_SESSION_TTL_HOURS".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }

    let db_max_connections = parse_as(
        "SAFEWAY_DB_MAX_CONNECTIONS",
        &or_default("SAFEWAY_DB_MAX_CONNECTIONS", "10"),
    )?;
    let db_min_connections = parse_as(
        "SAFEWAY_DB_MIN_CONNECTIONS",
        &or_default("SAFEWAY_DB_MIN_CONNECTIONS", "1"),
    )?;
    let db_acquire_timeout_secs = parse_as(
        "SAFEWAY_DB_ACQUIRE_TIMEOUT_SECS",
        &or_default("SAFEWAY_DB_ACQUIRE_TIMEOUT_SECS", "10"),
    )?;
    let rate_limit_per_minute = parse_as(
        "SAFEWAY_RATE_LIMIT_PER_MINUTE",
        &or_default("SAFEWAY_RATE_LIMIT_PER_MINUTE", "120"),
    )?;

    let opendata_api_key = lookup("OPENDATA_API_KEY")
        .ok()
        .filter(|k| !k.trim().is_empty());
    let opendata_base_url = or_default("OPENDATA_BASE_URL", "http://openapi.seoul.go.kr:8088");
    let opendata_cctv_service = or_default("OPENDATA_CCTV_SERVICE", "safeOpenCCTV");
    let opendata_streetlight_service =
        or_default("OPENDATA_STREETLIGHT_SERVICE", "safeOpenStreetLight");
    let opendata_page_size: u32 = parse_as(
        "OPENDATA_PAGE_SIZE",
        &or_default("OPENDATA_PAGE_SIZE", "1000"),
    )?;
    if opendata_page_size == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "OPENDATA_PAGE_SIZE".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    let opendata_max_records = parse_as(
        "OPENDATA_MAX_RECORDS",
        &or_default("OPENDATA_MAX_RECORDS", "200000"),
    )?;
    let opendata_request_timeout_secs = parse_as(
        "OPENDATA_REQUEST_TIMEOUT_SECS",
        &or_default("OPENDATA_REQUEST_TIMEOUT_SECS", "15"),
    )?;
    let opendata_max_retries = parse_as(
        "OPENDATA_MAX_RETRIES",
        &or_default("OPENDATA_MAX_RETRIES", "2"),
    )?;
    let opendata_retry_backoff_base_ms = parse_as(
        "OPENDATA_RETRY_BACKOFF_BASE_MS",
        &or_default("OPENDATA_RETRY_BACKOFF_BASE_MS", "500"),
    )?;
    let opendata_cache_ttl_secs = parse_as(
        "OPENDATA_CACHE_TTL_SECS",
        &or_default("OPENDATA_CACHE_TTL_SECS", "3600"),
    )?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        scoring_policy_path,
        password_pepper,
        session_ttl_hours,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        rate_limit_per_minute,
        opendata_api_key,
        opendata_base_url,
        opendata_cctv_service,
        opendata_streetlight_service,
        opendata_page_size,
        opendata_max_records,
        opendata_request_timeout_secs,
        opendata_max_retries,
        opendata_retry_backoff_base_ms,
        opendata_cache_ttl_secs,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] for anything other than
/// `development`, `test`, or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s.trim() {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "SAFEWAY_ENV".to_string(),
            reason: format!("expected development, test, or production; got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
