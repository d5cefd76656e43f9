use crate::app_config::{AppConfig, ClientConfig, Environment};
use crate::ConfigError;

const DEFAULT_API_URL: &str = "http://localhost:3000";
const DEFAULT_HTTP_TIMEOUT_SECS: &str = "30";

/// Load server configuration from environment variables.
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

/// Load server configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Load CLI configuration, reading `.env` first.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_client_config() -> Result<ClientConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_client_config_from_env()
}

/// Load CLI configuration from the process environment only.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_client_config_from_env() -> Result<ClientConfig, ConfigError> {
    build_client_config(|key| std::env::var(key))
}

fn parse_number<F, T>(lookup: &F, var: &str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = lookup(var).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
}

/// Build server configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("JKS_ENV", "development"))?;

    let raw_bind = or_default("JKS_BIND_ADDR", "0.0.0.0:3000");
    let bind_addr = raw_bind
        .parse::<SocketAddr>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: "JKS_BIND_ADDR".to_string(),
            reason: e.to_string(),
        })?;

    let log_level = or_default("JKS_LOG_LEVEL", "info");
    let public_base_url = or_default("JKS_PUBLIC_BASE_URL", DEFAULT_API_URL)
        .trim_end_matches('/')
        .to_string();

    let db_max_connections = parse_number(&lookup, "JKS_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_number(&lookup, "JKS_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_number(&lookup, "JKS_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let storage_url = optional("JKS_STORAGE_URL");
    let storage_key = optional("JKS_STORAGE_KEY");
    if storage_url.is_some() && storage_key.is_none() {
        return Err(ConfigError::MissingEnvVar("JKS_STORAGE_KEY".to_string()));
    }
    let storage_bucket = or_default("JKS_STORAGE_BUCKET", "product-images");
    let http_timeout_secs =
        parse_number(&lookup, "JKS_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?;
    let offer_sweep_cron = or_default("JKS_OFFER_SWEEP_CRON", "0 * * * * *");

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        public_base_url,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        storage_url,
        storage_key,
        storage_bucket,
        http_timeout_secs,
        offer_sweep_cron,
    })
}

fn build_client_config<F>(lookup: F) -> Result<ClientConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let api_url = lookup("JKS_API_URL")
        .unwrap_or_else(|_| DEFAULT_API_URL.to_string())
        .trim_end_matches('/')
        .to_string();
    if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
        return Err(ConfigError::InvalidEnvVar {
            var: "JKS_API_URL".to_string(),
            reason: format!("expected an http(s) URL, got '{api_url}'"),
        });
    }

    Ok(ClientConfig {
        api_url,
        http_timeout_secs: parse_number(
            &lookup,
            "JKS_HTTP_TIMEOUT_SECS",
            DEFAULT_HTTP_TIMEOUT_SECS,
        )?,
        log_level: lookup("JKS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "production" => Ok(Environment::Production),
        "test" => Ok(Environment::Test),
        other => Err(ConfigError::InvalidEnvVar {
            var: "JKS_ENV".to_string(),
            reason: format!("expected development, test, or production; got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
