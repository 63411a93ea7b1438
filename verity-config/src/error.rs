// Error types for settings and schema loading

use thiserror::Error;
use verity_validation::{SchemaError, ValidationErrors};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration key not found: {0}")]
    KeyNotFound(String),

    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid setting: {0}")]
    ValidationError(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvError(#[from] std::env::VarError),

    #[error("Invalid schema: {0}")]
    Schema(#[from] SchemaError),

    #[error("Unknown schema: {0}")]
    UnknownSchema(String),

    #[error("Record rejected by schema {schema}:\n{errors}")]
    Rejected {
        schema: String,
        errors: ValidationErrors,
    },
}

impl ConfigError {
    /// The validation report, when a record was rejected
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            ConfigError::Rejected { errors, .. } => Some(errors),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
