use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; HF-Monitor/1.0)";

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
/// Decoupled from the process environment so tests can drive it with a map.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

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

    let env = parse_environment(&or_default("HFMON_ENV", "development"))?;

    let bind_addr = or_default("HFMON_BIND_ADDR", "0.0.0.0:3000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("HFMON_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("HFMON_LOG_LEVEL", "info");
    let watchlist_path = PathBuf::from(or_default(
        "HFMON_WATCHLIST_PATH",
        "./config/watchlist.yaml",
    ));
    let data_dir = PathBuf::from(or_default("HFMON_DATA_DIR", "./data"));
    let youtube_api_key = optional("YOUTUBE_API_KEY");
    let naver_client_id = optional("NAVER_CLIENT_ID");
    let naver_client_secret = optional("NAVER_CLIENT_SECRET");
    let kakao_rest_api_key = optional("KAKAO_REST_API_KEY");

    let collector_timeout_secs = parse_u64("HFMON_COLLECTOR_TIMEOUT_SECS", "45")?;
    if collector_timeout_secs == 0 {
        return Err(invalid(
            "HFMON_COLLECTOR_TIMEOUT_SECS",
            "must be greater than zero".to_string(),
        ));
    }
    let request_timeout_secs = parse_u64("HFMON_REQUEST_TIMEOUT_SECS", "10")?;
    let user_agent = or_default("HFMON_USER_AGENT", DEFAULT_USER_AGENT);
    let rate_limit_per_minute = parse_usize("HFMON_RATE_LIMIT_PER_MINUTE", "60")?;

    let api_keys = or_default("HFMON_API_KEYS", "")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect();

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        watchlist_path,
        data_dir,
        youtube_api_key,
        naver_client_id,
        naver_client_secret,
        kakao_rest_api_key,
        collector_timeout_secs,
        request_timeout_secs,
        user_agent,
        rate_limit_per_minute,
        api_keys,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "HFMON_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
