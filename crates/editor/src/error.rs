use atelier_core::error::CoreError;

/// How a failure should be presented and whether retrying makes sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The user can fix the input (duplicate name, bad value, ...).
    Validation,
    /// The request never got an answer; retrying is safe.
    TransientNetwork,
    /// The server answered and refused; shown as-is, never auto-retried.
    ServerRejection,
    /// The operation would break a collection invariant and was refused.
    InvariantViolation,
}

/// Errors surfaced by editor operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditorError {
    #[error("{0}")]
    Validation(String),

    #[error("Network error: {0}")]
    TransientNetwork(String),

    #[error("Server rejected the request ({status}): {message}")]
    ServerRejection { status: u16, message: String },

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

pub type EditorResult<T> = Result<T, EditorError>;

impl EditorError {
    pub fn class(&self) -> ErrorClass {
        match self {
            EditorError::Validation(_) => ErrorClass::Validation,
            EditorError::TransientNetwork(_) => ErrorClass::TransientNetwork,
            EditorError::ServerRejection { .. } => ErrorClass::ServerRejection,
            EditorError::InvariantViolation(_) => ErrorClass::InvariantViolation,
        }
    }

    /// Whether the same request may succeed if simply sent again.
    pub fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::TransientNetwork
    }
}

impl From<CoreError> for EditorError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvariantViolation(msg) => EditorError::InvariantViolation(msg),
            CoreError::Internal(msg) => EditorError::InvariantViolation(msg),
            other => EditorError::Validation(other.to_string()),
        }
    }
}
