use std::path::PathBuf;

use thiserror::Error;

/// Errors returned when loading rule sets.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("rules path does not exist: {0}")]
    MissingPath(String),
    #[error("failed to read rules from {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse rules from {path}: {message}")]
    Parse { path: String, message: String },
    #[error("duplicate rule identifier detected: {id}")]
    DuplicateRule { id: String },
}

impl RuleError {
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RuleError::Io {
            path: path.into().display().to_string(),
            source,
        }
    }

    pub fn parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        RuleError::Parse {
            path: path.into().display().to_string(),
            message: message.into(),
        }
    }
}

/// Malformed request parameters. Fails the whole request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("parameter {param} is not a boolean: {value}")]
    InvalidFlag { param: &'static str, value: String },
    #[error("unrecognized page type: {0}")]
    UnknownPageType(String),
    #[error("parameter {param} contains an empty value")]
    EmptyValue { param: &'static str },
    #[error("category path {path:?} contains an empty token")]
    EmptyCategoryToken { path: String },
}

/// A single malformed effect. The effect is skipped and evaluation continues.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RuleEffectError {
    #[error("rule {rule_id} carries an unknown effect kind")]
    UnknownEffect { rule_id: String },
    #[error("rule {rule_id} pins to position {position}; positions start at 1")]
    InvalidPosition { rule_id: String, position: usize },
    #[error("rule {rule_id} redirects to an invalid target: {target}")]
    InvalidRedirect { rule_id: String, target: String },
    #[error("rule {rule_id} injects a facet without a field")]
    InvalidFacet { rule_id: String },
    #[error("rule {rule_id} targets an empty {kind} set")]
    EmptyTarget { rule_id: String, kind: &'static str },
    #[error("rule {rule_id} uses an unknown product target")]
    UnknownTarget { rule_id: String },
    #[error("rule {rule_id} has a malformed {kind} effect: {message}")]
    MalformedEffect {
        rule_id: String,
        kind: String,
        message: String,
    },
}

impl RuleEffectError {
    pub fn rule_id(&self) -> &str {
        match self {
            RuleEffectError::UnknownEffect { rule_id }
            | RuleEffectError::InvalidPosition { rule_id, .. }
            | RuleEffectError::InvalidRedirect { rule_id, .. }
            | RuleEffectError::InvalidFacet { rule_id }
            | RuleEffectError::EmptyTarget { rule_id, .. }
            | RuleEffectError::UnknownTarget { rule_id }
            | RuleEffectError::MalformedEffect { rule_id, .. } => rule_id,
        }
    }
}
