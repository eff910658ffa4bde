use thiserror::Error;

/// Result type used across the core crate.
pub type Result<T> = std::result::Result<T, MerchError>;

/// Canonical error representation shared by the services.
#[derive(Debug, Error)]
pub enum MerchError {
    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    General(String),
}

impl From<serde_json::Error> for MerchError {
    fn from(err: serde_json::Error) -> Self {
        MerchError::Deserialization(err.to_string())
    }
}

impl From<anyhow::Error> for MerchError {
    fn from(err: anyhow::Error) -> Self {
        MerchError::General(err.to_string())
    }
}

/// Dedicated configuration error used by the configuration module.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable missing: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {key}: {source}")]
    InvalidEnvVar {
        key: &'static str,
        #[source]
        source: std::env::VarError,
    },

    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}

impl From<ConfigError> for MerchError {
    fn from(value: ConfigError) -> Self {
        MerchError::Config(value.to_string())
    }
}
