//! Error types for railtrack

use thiserror::Error;

/// Classified failure of a remote platform call.
///
/// Every transport or decoding failure is mapped onto one of these kinds before
/// it leaves the HTTP layer; raw reqwest errors never escape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Platform unreachable: {0}")]
    Unreachable(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// Discriminant of [`ApiError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    Unreachable,
    Unauthorized,
    MalformedResponse,
}

impl ApiError {
    pub fn kind(&self) -> ApiErrorKind {
        match self {
            ApiError::Unreachable(_) => ApiErrorKind::Unreachable,
            ApiError::Unauthorized(_) => ApiErrorKind::Unauthorized,
            ApiError::MalformedResponse(_) => ApiErrorKind::MalformedResponse,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::MalformedResponse(err.to_string())
        } else {
            ApiError::Unreachable(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::MalformedResponse(err.to_string())
    }
}

/// Main error type for the tracker application
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Shutdown error: {0}")]
    ShutdownError(String),
}
