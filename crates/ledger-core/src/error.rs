//! Caller-facing error taxonomy.
//!
//! Lower layers return `anyhow::Result`, carrying a typed
//! [`ValidationError`] when a payload is malformed. The use-case layer is
//! the only place that turns those into a [`LedgerError`].

use ledger_db::models::ValidationError;

/// Result type alias for use-case and tool operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The payload failed shape or value checks. Never retried.
    #[error("validation error: {0}")]
    Validation(String),

    /// The requested id does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Anything else: storage unavailable, constraint violation, ...
    #[error("failed to {operation} item: {source:#}")]
    OperationFailed {
        operation: &'static str,
        source: anyhow::Error,
    },
}

impl LedgerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<ValidationError> for LedgerError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Classify a repository failure for `operation`.
///
/// Validation failures keep their message; everything else becomes
/// [`LedgerError::OperationFailed`] and is logged with its full chain first.
pub(crate) fn classify(operation: &'static str, err: anyhow::Error) -> LedgerError {
    if let Some(validation) = err.downcast_ref::<ValidationError>() {
        tracing::error!(operation, error = %validation, "payload validation failed");
        return LedgerError::Validation(validation.to_string());
    }
    tracing::error!(operation, error = ?err, "unexpected failure");
    LedgerError::OperationFailed {
        operation,
        source: err,
    }
}
