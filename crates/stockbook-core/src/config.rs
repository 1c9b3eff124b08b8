use thiserror::Error;

use crate::app_config::{AppConfig, Environment};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    MissingEnvVar(String),
    #[error("invalid value for env var {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

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

/// Load application configuration from environment variables already in the
/// process, without touching `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// The parsing/validation logic is decoupled from the real environment so it
/// can be tested with a plain `HashMap` lookup.
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

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let database_url = require("DATABASE_URL")?;
    let storage_url = require("STOCKBOOK_STORAGE_URL")?;
    let storage_key = require("STOCKBOOK_STORAGE_KEY")?;

    let env = parse_environment(&or_default("STOCKBOOK_ENV", "development"));
    let bind_addr = parse_addr("STOCKBOOK_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("STOCKBOOK_LOG_LEVEL", "info");

    let anthropic_api_key = lookup("ANTHROPIC_API_KEY").ok();
    let ai_model = or_default("STOCKBOOK_AI_MODEL", "claude-sonnet-4-20250514");
    let ai_base_url = or_default("STOCKBOOK_AI_BASE_URL", "https://api.anthropic.com");

    let storage_bucket = or_default("STOCKBOOK_STORAGE_BUCKET", "product-images");

    let upc_database_api_key = lookup("UPC_DATABASE_API_KEY").ok();
    let barcode_lookup_api_key = lookup("BARCODE_LOOKUP_API_KEY").ok();

    let fetch_user_agent = or_default(
        "STOCKBOOK_FETCH_USER_AGENT",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    );
    let fetch_timeout_secs = parse_u64("STOCKBOOK_FETCH_TIMEOUT_SECS", "30")?;
    let headless_nav_timeout_secs = parse_u64("STOCKBOOK_HEADLESS_NAV_TIMEOUT_SECS", "45")?;
    let headless_render_delay_ms = parse_u64("STOCKBOOK_HEADLESS_RENDER_DELAY_MS", "5000")?;
    let chrome_executable = lookup("STOCKBOOK_CHROME_EXECUTABLE").ok();

    let db_max_connections = parse_u32("STOCKBOOK_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("STOCKBOOK_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("STOCKBOOK_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        anthropic_api_key,
        ai_model,
        ai_base_url,
        storage_url,
        storage_key,
        storage_bucket,
        upc_database_api_key,
        barcode_lookup_api_key,
        fetch_user_agent,
        fetch_timeout_secs,
        headless_nav_timeout_secs,
        headless_render_delay_ms,
        chrome_executable,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
    })
}

fn parse_environment(raw: &str) -> Environment {
    match raw.trim().to_ascii_lowercase().as_str() {
        "production" | "prod" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}
