use crate::app_config::{AppConfig, DetectSettings, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files, which is useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup; no `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_positive_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let value: f64 = parse_num(var, &or_default(var, default))?;
        if !value.is_finite() || value <= 0.0 {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: format!("must be a positive number, got {value}"),
            });
        }
        Ok(value)
    };

    let env = parse_environment(&or_default("SAILVENUE_ENV", "development"))?;

    let bind_addr = parse("SAILVENUE_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("SAILVENUE_LOG_LEVEL", "info");
    let venues_path = PathBuf::from(or_default("SAILVENUE_VENUES_PATH", "./config/venues.yaml"));

    let agent_url = lookup("SAILVENUE_AGENT_URL").ok();
    let agent_api_key = lookup("SAILVENUE_AGENT_API_KEY").ok();
    let agent_model = or_default("SAILVENUE_AGENT_MODEL", "venue-detector");
    let agent_request_timeout_secs: u64 = parse_num(
        "SAILVENUE_AGENT_REQUEST_TIMEOUT_SECS",
        &or_default("SAILVENUE_AGENT_REQUEST_TIMEOUT_SECS", "30"),
    )?;

    let detect = DetectSettings {
        radius_km: parse_positive_f64("SAILVENUE_DETECT_RADIUS_KM", "50")?,
        max_alternatives: parse_num(
            "SAILVENUE_DETECT_MAX_ALTERNATIVES",
            &or_default("SAILVENUE_DETECT_MAX_ALTERNATIVES", "3"),
        )?,
        deadline_ms: parse_num(
            "SAILVENUE_DETECT_DEADLINE_MS",
            &or_default("SAILVENUE_DETECT_DEADLINE_MS", "8000"),
        )?,
        cache_ttl_secs: parse_num(
            "SAILVENUE_CACHE_TTL_SECS",
            &or_default("SAILVENUE_CACHE_TTL_SECS", "30"),
        )?,
        cache_cell_meters: parse_positive_f64("SAILVENUE_CACHE_CELL_METERS", "50")?,
    };

    let rate_limit_per_minute: usize = parse_num(
        "SAILVENUE_RATE_LIMIT_PER_MINUTE",
        &or_default("SAILVENUE_RATE_LIMIT_PER_MINUTE", "120"),
    )?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        venues_path,
        agent_url,
        agent_api_key,
        agent_model,
        agent_request_timeout_secs,
        detect,
        rate_limit_per_minute,
    })
}

fn parse_num<T>(var: &str, raw: &str) -> Result<T, ConfigError>
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
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] for anything other than
/// `development`, `test` or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s.trim() {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "SAILVENUE_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
