use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::{ConfigError, MerchError};

const DEFAULT_HTTP_BIND: &str = "0.0.0.0:8085";
const DEFAULT_REFRESH_SECS: u64 = 60;

/// Runtime environment used by the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "staging" | "stage" => Environment::Staging,
            _ => Environment::Development,
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::Development
    }
}

/// Settings for the rule manager service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub environment: Environment,
    pub http_bind: String,
    /// File or directory holding rule definitions. `None` starts with an empty rule set.
    pub rules_path: Option<PathBuf>,
    /// Poll interval for rule refresh. `None` disables refresh.
    pub refresh_interval: Option<Duration>,
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            http_bind: DEFAULT_HTTP_BIND.to_string(),
            rules_path: None,
            refresh_interval: Some(Duration::from_secs(DEFAULT_REFRESH_SECS)),
            log_level: "info".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Loads configuration from the process environment (`MERCH_` prefix).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_env_with_prefix("MERCH_")
    }

    /// Loads configuration from env vars prefixed with the provided value.
    pub fn from_env_with_prefix(prefix: &str) -> Result<Self, ConfigError> {
        let key = |suffix: &str| format!("{}{}", prefix, suffix);

        let environment = env::var(key("ENV"))
            .map(|raw| Environment::parse(&raw))
            .unwrap_or_default();

        let http_bind = read_non_empty(&key("HTTP_BIND"))
            .unwrap_or_else(|| DEFAULT_HTTP_BIND.to_string());

        let rules_path = read_non_empty(&key("RULES_PATH")).map(PathBuf::from);

        let refresh_secs =
            parse_env::<u64>(&key("REFRESH_SECS"), "REFRESH_SECS", DEFAULT_REFRESH_SECS)?;
        let refresh_interval = (refresh_secs > 0).then(|| Duration::from_secs(refresh_secs));

        let log_level = read_non_empty(&key("LOG_LEVEL")).unwrap_or_else(|| "info".to_string());

        Ok(Self {
            environment,
            http_bind,
            rules_path,
            refresh_interval,
            log_level,
        })
    }

    /// Whether the service is running in production.
    pub fn is_production(&self) -> bool {
        matches!(self.environment, Environment::Production)
    }
}

/// Helper that loads config and converts to the canonical error type.
pub fn load_service_config() -> Result<ServiceConfig, MerchError> {
    Ok(ServiceConfig::from_env()?)
}

fn read_non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_env<T>(key: &str, label: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                Ok(default)
            } else {
                T::from_str(trimmed).map_err(|err| ConfigError::InvalidValue {
                    key: label,
                    message: err.to_string(),
                })
            }
        }
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(ConfigError::InvalidEnvVar {
            key: label,
            source: err,
        }),
    }
}
