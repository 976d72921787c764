use thiserror::Error;
use zipline_core::ValidateError;

/// Errors surfaced to callers of the link service.
///
/// Each variant is a stable machine-readable kind; the `Display` text is
/// the human-readable message. `NotAvailable` deliberately folds the
/// not-found and expired cases together so callers cannot probe which
/// codes ever existed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("target not allowed: {0}")]
    ForbiddenTarget(String),
    #[error("short code already in use: {0}")]
    Conflict(String),
    #[error("link not found or expired")]
    NotAvailable,
    #[error("deletion token does not match")]
    Unauthorized,
    #[error("storage failure: {0}")]
    Storage(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ValidateError> for ServiceError {
    fn from(err: ValidateError) -> Self {
        match err {
            ValidateError::ForbiddenTarget(message) => Self::ForbiddenTarget(message),
            ValidateError::InvalidTarget(_)
            | ValidateError::InvalidCustomCode(_)
            | ValidateError::InvalidTtl(_) => Self::InvalidInput(err.to_string()),
        }
    }
}
