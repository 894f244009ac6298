use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

pub const DEFAULT_GATEWAY_URL: &str = "https://api-sg.aliexpress.com/sync";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
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
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Upstream credentials are optional here: a missing key is reported per call
/// by the affiliate client, so the service still starts and answers with empty
/// results instead of refusing to boot.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    // Empty values are treated like unset ones; hosting dashboards often
    // leave a blank entry behind.
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let env = parse_environment(&or_default("GIFTREC_ENV", "development"));

    let bind_addr = or_default("GIFTREC_BIND_ADDR", "0.0.0.0:3000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("GIFTREC_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("GIFTREC_LOG_LEVEL", "info");

    let upstream_timeout_secs = or_default("GIFTREC_UPSTREAM_TIMEOUT_SECS", "10")
        .parse::<u64>()
        .map_err(|e| invalid("GIFTREC_UPSTREAM_TIMEOUT_SECS", e.to_string()))?;
    if upstream_timeout_secs == 0 {
        return Err(invalid(
            "GIFTREC_UPSTREAM_TIMEOUT_SECS",
            "must be at least 1".to_string(),
        ));
    }

    let max_pages = or_default("GIFTREC_MAX_PAGES", "1")
        .parse::<u32>()
        .map_err(|e| invalid("GIFTREC_MAX_PAGES", e.to_string()))?;
    if max_pages == 0 {
        return Err(invalid("GIFTREC_MAX_PAGES", "must be at least 1".to_string()));
    }

    let target_items = or_default("GIFTREC_TARGET_ITEMS", "12")
        .parse::<usize>()
        .map_err(|e| invalid("GIFTREC_TARGET_ITEMS", e.to_string()))?;

    let diagnostics_enabled = match optional("GIFTREC_DIAGNOSTICS") {
        Some(raw) => parse_bool(&raw).ok_or_else(|| {
            invalid(
                "GIFTREC_DIAGNOSTICS",
                format!("expected true/false/1/0, got '{raw}'"),
            )
        })?,
        None => env != Environment::Production,
    };

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        ae_app_key: optional("AE_APP_KEY"),
        ae_app_secret: optional("AE_APP_SECRET"),
        ae_tracking_id: optional("AE_TRACKING_ID"),
        ae_gateway_url: or_default("AE_GATEWAY_URL", DEFAULT_GATEWAY_URL),
        upstream_timeout_secs,
        user_agent: or_default("GIFTREC_USER_AGENT", "giftrec/0.1 (gift-recommendations)"),
        max_pages,
        target_items,
        catalog_path: optional("GIFTREC_CATALOG_PATH").map(PathBuf::from),
        diagnostics_enabled,
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

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
