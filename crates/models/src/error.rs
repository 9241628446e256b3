use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ErrorShape {
    pub error_message: String,
    pub error_type: String,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("Payload too large: {size} bytes (max: {max_size})")]
    PayloadTooLarge { size: u64, max_size: u64 },

    #[error("Storage error: {reason}")]
    Storage { reason: String },

    #[error("Upstream error: {reason}")]
    Upstream { reason: String },

    #[error("Configuration error: {reason}")]
    Config { reason: String },

    #[error("Cooking agent unavailable: {reason}")]
    AgentUnavailable { reason: String },

    #[error("Packaging error: {reason}")]
    Packaging { reason: String },

    #[error("Internal server error: {reason}")]
    Internal { reason: String },
}

impl AppError {
    pub fn to_error_shape(&self) -> ErrorShape {
        ErrorShape {
            error_message: self.to_string(),
            error_type: self.error_type().to_string(),
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::InvalidRequest { .. } => "InvalidRequestException",
            AppError::PayloadTooLarge { .. } => "PayloadTooLargeException",
            AppError::Storage { .. } => "StorageException",
            AppError::Upstream { .. } => "UpstreamException",
            AppError::Config { .. } => "ConfigurationException",
            AppError::AgentUnavailable { .. } => "ServiceUnavailableException",
            AppError::Packaging { .. } => "PackagingException",
            AppError::Internal { .. } => "ServiceException",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            AppError::InvalidRequest { .. } => 400,
            AppError::PayloadTooLarge { .. } => 413,
            AppError::Storage { .. } => 502,
            AppError::Upstream { .. } => 502,
            AppError::Config { .. } => 500,
            AppError::AgentUnavailable { .. } => 503,
            AppError::Packaging { .. } => 500,
            AppError::Internal { .. } => 500,
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        AppError::InvalidRequest {
            reason: reason.into(),
        }
    }

    pub fn storage(reason: impl ToString) -> Self {
        AppError::Storage {
            reason: reason.to_string(),
        }
    }

    pub fn upstream(reason: impl ToString) -> Self {
        AppError::Upstream {
            reason: reason.to_string(),
        }
    }

    pub fn internal(reason: impl ToString) -> Self {
        AppError::Internal {
            reason: reason.to_string(),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Internal {
            reason: e.to_string(),
        }
    }
}
