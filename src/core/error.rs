//! Crate-wide error taxonomy: the request-level kinds this system's callers
//! need to map onto an error envelope — `Validation`, `NotFound`, `Conflict`,
//! `RateLimited`, `PayloadTooLarge`, `Unauthorized`, `Internal`.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum CoreError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("payload too large")]
    PayloadTooLarge,

    #[error("unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Internal(String),
}

impl CoreError {
    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::Validation(_) => "ValidationError",
            CoreError::NotFound(_) => "NotFound",
            CoreError::Conflict(_) => "Conflict",
            CoreError::RateLimited => "RateLimited",
            CoreError::PayloadTooLarge => "PayloadTooLarge",
            CoreError::Unauthorized => "Unauthorized",
            CoreError::Internal(_) => "InternalError",
        }
    }

    /// HTTP status an outer router is expected to map this to. The router
    /// itself lives outside this crate's scope.
    pub fn status_code(&self) -> u16 {
        match self {
            CoreError::Validation(_) => 400,
            CoreError::NotFound(_) => 404,
            CoreError::Conflict(_) => 409,
            CoreError::RateLimited => 429,
            CoreError::PayloadTooLarge => 413,
            CoreError::Unauthorized => 401,
            CoreError::Internal(_) => 500,
        }
    }

    pub fn column_not_found(name: &str) -> Self {
        CoreError::Validation(format!("Column '{name}' not found in dataset"))
    }

    pub fn invalid_dataset_id(id: &str) -> Self {
        CoreError::Validation(format!("Invalid dataset id '{id}'"))
    }
}

impl From<std::io::Error> for CoreError {
    fn from(error: std::io::Error) -> Self {
        if error.kind() == std::io::ErrorKind::NotFound {
            CoreError::NotFound(error.to_string())
        } else {
            CoreError::Internal(error.to_string())
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(error: serde_json::Error) -> Self {
        CoreError::Internal(error.to_string())
    }
}

impl From<anyhow::Error> for CoreError {
    fn from(error: anyhow::Error) -> Self {
        CoreError::Internal(error.to_string())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
