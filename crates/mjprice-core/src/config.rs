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

/// Build application configuration using the provided env-var lookup function,
/// so tests can drive it from a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let store_url = require("SUPABASE_URL")?;
    let store_api_key = require("SUPABASE_ANON_KEY")?;

    let env = parse_environment(&or_default("MJPRICE_ENV", "development"));
    let bind_addr: SocketAddr = parse_as(
        "MJPRICE_BIND_ADDR",
        &or_default("MJPRICE_BIND_ADDR", "0.0.0.0:3000"),
    )?;
    let log_level = or_default("MJPRICE_LOG_LEVEL", "info");

    let store_request_timeout_secs: u64 = parse_as(
        "MJPRICE_STORE_REQUEST_TIMEOUT_SECS",
        &or_default("MJPRICE_STORE_REQUEST_TIMEOUT_SECS", "30"),
    )?;
    let store_max_retries: u32 = parse_as(
        "MJPRICE_STORE_MAX_RETRIES",
        &or_default("MJPRICE_STORE_MAX_RETRIES", "3"),
    )?;
    let store_retry_backoff_base_ms: u64 = parse_as(
        "MJPRICE_STORE_RETRY_BACKOFF_BASE_MS",
        &or_default("MJPRICE_STORE_RETRY_BACKOFF_BASE_MS", "500"),
    )?;
    let report_rate_limit_per_minute: usize = parse_as(
        "MJPRICE_REPORT_RATE_LIMIT_PER_MINUTE",
        &or_default("MJPRICE_REPORT_RATE_LIMIT_PER_MINUTE", "30"),
    )?;

    Ok(AppConfig {
        store_url,
        store_api_key,
        env,
        bind_addr,
        log_level,
        store_request_timeout_secs,
        store_max_retries,
        store_retry_backoff_base_ms,
        report_rate_limit_per_minute,
    })
}

/// Parse a raw env-var value, reporting failures against the variable name.
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

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}
