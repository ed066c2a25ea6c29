use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

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
/// Decoupled from the real environment so tests can drive it with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
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

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let env = parse_environment(&or_default("HARVEST_ENV", "development"))?;
    let log_level = or_default("HARVEST_LOG_LEVEL", "info");
    let suppliers_dir = PathBuf::from(or_default("HARVEST_SUPPLIERS_DIR", "./config/suppliers"));
    let scenarios_dir = PathBuf::from(or_default("HARVEST_SCENARIOS_DIR", "./config/scenarios"));
    let output_path = PathBuf::from(or_default("HARVEST_OUTPUT_PATH", "./output/records.json"));

    let webdriver_url = or_default("HARVEST_WEBDRIVER_URL", "http://127.0.0.1:4444");
    if !(webdriver_url.starts_with("http://") || webdriver_url.starts_with("https://")) {
        return Err(invalid(
            "HARVEST_WEBDRIVER_URL",
            format!("\"{webdriver_url}\" is not an http(s) URL"),
        ));
    }

    let max_pages = parse_usize("HARVEST_MAX_PAGES", "200")?;
    let item_delay_ms = parse_u64("HARVEST_ITEM_DELAY_MS", "0")?;
    let request_timeout_secs = parse_u64("HARVEST_REQUEST_TIMEOUT_SECS", "30")?;
    let max_retries = parse_u32("HARVEST_MAX_RETRIES", "2")?;
    let retry_backoff_base_secs = parse_u64("HARVEST_RETRY_BACKOFF_BASE_SECS", "1")?;

    Ok(AppConfig {
        env,
        log_level,
        suppliers_dir,
        scenarios_dir,
        output_path,
        webdriver_url,
        max_pages,
        item_delay_ms,
        request_timeout_secs,
        max_retries,
        retry_backoff_base_secs,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "HARVEST_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
