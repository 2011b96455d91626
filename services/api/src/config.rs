//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Credentials for the FCM HTTP v1 API. Push is disabled without them.
#[derive(Clone, Debug)]
pub struct FcmConfig {
    pub project_id: String,
    pub access_token: String,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub database_max_connections: u32,
    pub log_level: Level,
    pub jwt_secret: String,
    pub jwt_expiration_minutes: i64,
    pub fcm: Option<FcmConfig>,
    pub fcm_endpoint: String,
    pub push_timeout: Duration,
    pub cors_allowed_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required =
            |key: &str| var(key).ok_or_else(|| ConfigError::MissingVar(key.to_string()));

        // --- Server and Database ---
        let bind_address = parse(
            "BIND_ADDRESS",
            var("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
        )?;
        let database_url = required("DATABASE_URL")?;
        let database_max_connections = parse(
            "DATABASE_MAX_CONNECTIONS",
            var("DATABASE_MAX_CONNECTIONS").unwrap_or_else(|| "5".to_string()),
        )?;

        let log_level_str = var("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Tokens ---
        let jwt_secret = required("JWT_SECRET")?;
        let jwt_expiration_minutes: i64 = parse(
            "JWT_EXPIRATION_MINUTES",
            var("JWT_EXPIRATION_MINUTES").unwrap_or_else(|| "1440".to_string()),
        )?;
        if jwt_expiration_minutes <= 0 {
            return Err(ConfigError::InvalidValue(
                "JWT_EXPIRATION_MINUTES".to_string(),
                "must be positive".to_string(),
            ));
        }

        // --- Push ---
        let fcm = match (var("FCM_PROJECT_ID"), var("FCM_ACCESS_TOKEN")) {
            (Some(project_id), Some(access_token)) => Some(FcmConfig {
                project_id,
                access_token,
            }),
            _ => None,
        };
        let fcm_endpoint = var("FCM_ENDPOINT")
            .unwrap_or_else(|| "https://fcm.googleapis.com".to_string())
            .trim_end_matches('/')
            .to_string();
        let push_timeout_secs: u64 = parse(
            "PUSH_TIMEOUT_SECS",
            var("PUSH_TIMEOUT_SECS").unwrap_or_else(|| "5".to_string()),
        )?;

        let cors_allowed_origin =
            var("CORS_ALLOWED_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());

        Ok(Self {
            bind_address,
            database_url,
            database_max_connections,
            log_level,
            jwt_secret,
            jwt_expiration_minutes,
            fcm,
            fcm_endpoint,
            push_timeout: Duration::from_secs(push_timeout_secs),
            cors_allowed_origin,
        })
    }
}

fn parse<T>(key: &str, raw: String) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_required_vars_are_set() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/solicare"),
            ("JWT_SECRET", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.bind_address.port(), 8080);
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.jwt_expiration_minutes, 1440);
        assert!(config.fcm.is_none());
        assert_eq!(config.push_timeout, Duration::from_secs(5));
    }

    #[test]
    fn missing_secret_is_reported_by_name() {
        let err = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://x")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(ref v) if v == "JWT_SECRET"));
    }

    #[test]
    fn fcm_needs_both_project_and_token() {
        let base = [
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "s"),
            ("FCM_PROJECT_ID", "solicare"),
        ];
        assert!(Config::from_lookup(lookup(&base)).unwrap().fcm.is_none());

        let mut full = base.to_vec();
        full.push(("FCM_ACCESS_TOKEN", "ya29.token"));
        full.push(("FCM_ENDPOINT", "http://localhost:9099/"));
        let config = Config::from_lookup(lookup(&full)).unwrap();
        assert_eq!(config.fcm.unwrap().project_id, "solicare");
        assert_eq!(config.fcm_endpoint, "http://localhost:9099");
    }

    #[test]
    fn bad_numbers_are_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "s"),
            ("PUSH_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref v, _) if v == "PUSH_TIMEOUT_SECS"));
    }
}
