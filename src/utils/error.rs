use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashError {
    #[error("API request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("{message}")]
    UpstreamError { message: String },

    #[error("{message}")]
    ValidationError { message: String },

    #[error("Configuration error: {field} = '{value}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

impl DashError {
    pub fn upstream(message: impl Into<String>) -> Self {
        DashError::UpstreamError {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        DashError::ValidationError {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DashError>;
