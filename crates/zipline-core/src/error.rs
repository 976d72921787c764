use thiserror::Error;

/// Errors raised while validating a submitted target URL, custom code, or
/// TTL class. All of these are boundary errors: reported to the caller,
/// never retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidateError {
    #[error("invalid target url: {0}")]
    InvalidTarget(String),
    #[error("target not allowed: {0}")]
    ForbiddenTarget(String),
    #[error("invalid custom code: {0}")]
    InvalidCustomCode(String),
    #[error("unrecognized ttl {0:?}")]
    InvalidTtl(String),
}

/// Errors returned by [`LinkStore`][crate::store::LinkStore] operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// An active record already occupies the code.
    #[error("short code already in use: {0}")]
    CodeCollision(String),
    #[error("no record for code {0:?}")]
    NotFound(String),
    /// The record existed but its expiry has passed; it has been evicted.
    #[error("record for code {0:?} has expired")]
    Expired(String),
    #[error("deletion token does not match for code {0:?}")]
    Unauthorized(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage operation failed: {0}")]
    Operation(String),
}

impl StoreError {
    /// Whether the failure is transient and safe to retry for idempotent
    /// operations.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::Timeout(_))
    }
}
