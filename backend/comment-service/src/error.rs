/// Error types for Comment Service
///
/// Store-level failures (`StoreError`) are translated into this service-facing
/// taxonomy. Callers get the cause for the three rejection kinds; `Internal`
/// keeps backend detail for logs only and renders a generic message.
use crate::storage::StoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::ValidationErrors;

/// Result type for comment-service operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Category of an `AppError`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    PolicyViolation,
    Validation,
    Internal,
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Post, comment or parent comment absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation forbidden by the post's settings
    #[error("Policy violation: {0}")]
    PolicyViolation(String),

    /// Caller input rejected
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Unclassified backend failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::PolicyViolation(_) => ErrorKind::PolicyViolation,
            AppError::ValidationError(_) => ErrorKind::Validation,
            AppError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Prefix the message with the failing operation, keeping the kind.
    pub fn context(self, operation: &str) -> Self {
        match self {
            AppError::NotFound(msg) => AppError::NotFound(format!("{}: {}", operation, msg)),
            AppError::PolicyViolation(msg) => {
                AppError::PolicyViolation(format!("{}: {}", operation, msg))
            }
            AppError::ValidationError(msg) => {
                AppError::ValidationError(format!("{}: {}", operation, msg))
            }
            AppError::Internal(msg) => AppError::Internal(format!("{}: {}", operation, msg)),
        }
    }

    /// HTTP-style status for the embedding transport
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::NotFound => 404,
            ErrorKind::PolicyViolation => 403,
            ErrorKind::Validation => 400,
            ErrorKind::Internal => 500,
        }
    }

    /// Message safe to show to a client
    pub fn public_message(&self) -> String {
        match self {
            AppError::Internal(_) => "internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

/// Client-facing error body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: ErrorKind,
    pub status: u16,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        Self {
            error: err.public_message(),
            kind: err.kind(),
            status: err.status_code(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::PostNotFound(_)
            | StoreError::CommentNotFound(_)
            | StoreError::ParentNotFound(_) => AppError::NotFound(err.to_string()),
            StoreError::CommentsNotAllowed(_) => AppError::PolicyViolation(err.to_string()),
            StoreError::InvalidWindow { .. } => AppError::ValidationError(err.to_string()),
            StoreError::HierarchyCorrupted { .. }
            | StoreError::Timeout(_)
            | StoreError::Database(_) => AppError::Internal(err.to_string()),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}
