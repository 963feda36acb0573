use thiserror::Error;

/// Error type that captures common ledger failures.
///
/// Validation errors are raised synchronously before any store call is
/// attempted; store errors carry the backend's reason and are never
/// swallowed.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("store error: {0}")]
    Store(String),
    #[error("no verified user is signed in")]
    Unauthenticated,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl LedgerError {
    pub fn validation(message: impl Into<String>) -> Self {
        LedgerError::Validation(message.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        LedgerError::NotFound(what.into())
    }
}
