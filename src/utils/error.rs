use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Fetch failed for {url} after {attempts} attempt(s): {message}")]
    FetchError {
        url: String,
        attempts: u32,
        message: String,
    },

    #[error("No content retrieved from {url}")]
    EmptyContent { url: String },

    #[error("No valid {format} rules to save")]
    NoRules { format: String },

    #[error("Failed to save {}: {source}", path.display())]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid record - {record}: {reason}")]
    RecordError { record: String, reason: String },

    #[error("HTTP client error: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

impl EtlError {
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::FetchError { .. } | EtlError::ApiError(_) => {
                "Check network connectivity, the source URL and the PROXY setting"
            }
            EtlError::EmptyContent { .. } | EtlError::NoRules { .. } => {
                "The source list returned no usable entries; retry later"
            }
            EtlError::WriteError { .. } | EtlError::IoError(_) => {
                "Check that the output directory exists and is writable"
            }
            EtlError::RecordError { .. } => "The offending record was skipped",
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. } => {
                "Review the command-line flags and the configuration file"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
