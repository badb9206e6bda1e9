use std::fmt::Display;
use std::num::ParseIntError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read config input: {0}")]
    Io(#[from] std::io::Error),

    #[error("config key not found: {0}")]
    NotFound(String),

    #[error("invalid integer for '{name}': {value:?} ({source})")]
    InvalidInteger {
        name: String,
        value: String,
        source: ParseIntError,
    },

    #[error("invalid boolean for '{name}': {value:?}")]
    InvalidBool { name: String, value: String },

    #[error("value {value} for '{name}' does not fit in {target}")]
    OutOfRange {
        name: String,
        value: i64,
        target: &'static str,
    },

    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    #[error("{0}")]
    Message(String),
}

impl ConfigError {
    /// Returns true for the missing-key condition, the only one a bind tolerates.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl serde::de::Error for ConfigError {
    fn custom<T: Display>(msg: T) -> Self {
        Self::Message(msg.to_string())
    }

    // Field names are fed once each, so a repeat only comes from
    // `#[serde(alias)]` resolving two names to the same field.
    fn duplicate_field(field: &'static str) -> Self {
        Self::UnsupportedType(format!(
            "field '{field}' has an alias; aliased fields cannot be bound"
        ))
    }
}
