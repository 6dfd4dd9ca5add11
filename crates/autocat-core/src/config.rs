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
/// Parsing is decoupled from the process environment so tests can drive it
/// with a plain `HashMap`.
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

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_capacity = |var: &str, default: &str| -> Result<usize, ConfigError> {
        match or_default(var, default).trim().parse::<usize>() {
            Ok(0) => Err(invalid(var, "must be at least 1".to_string())),
            Ok(n) => Ok(n),
            Err(e) => Err(invalid(var, e.to_string())),
        }
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        match or_default(var, default).trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(invalid(var, format!("expected a boolean, got \"{other}\""))),
        }
    };

    let api_base_url = require("AUTOCAT_API_BASE_URL")?
        .trim_end_matches('/')
        .to_string();

    let env = parse_environment(&or_default("AUTOCAT_ENV", "development"))?;

    let bind_addr = parse_addr("AUTOCAT_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("AUTOCAT_LOG_LEVEL", "info");
    let site_base_url =
        optional("AUTOCAT_SITE_BASE_URL").map(|v| v.trim_end_matches('/').to_string());
    let taxonomy_path = optional("AUTOCAT_TAXONOMY_PATH").map(PathBuf::from);

    let request_timeout_secs = parse_u64("AUTOCAT_REQUEST_TIMEOUT_SECS", "15")?;
    let user_agent = or_default("AUTOCAT_USER_AGENT", "autocat/0.1 (catalog)");
    let max_retries = parse_u32("AUTOCAT_MAX_RETRIES", "2")?;
    let retry_backoff_base_ms = parse_u64("AUTOCAT_RETRY_BACKOFF_BASE_MS", "250")?;

    let taxonomy_freshness_secs = parse_u64("AUTOCAT_TAXONOMY_FRESHNESS_SECS", "900")?;
    let listing_freshness_secs = parse_u64("AUTOCAT_LISTING_FRESHNESS_SECS", "300")?;
    let cache_enabled = parse_bool("AUTOCAT_CACHE_ENABLED", "true")?;
    let cache_capacity = parse_capacity("AUTOCAT_CACHE_CAPACITY", "1024")?;

    Ok(AppConfig {
        api_base_url,
        env,
        bind_addr,
        log_level,
        site_base_url,
        taxonomy_path,
        request_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_ms,
        taxonomy_freshness_secs,
        listing_freshness_secs,
        cache_enabled,
        cache_capacity,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s.trim() {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "AUTOCAT_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
