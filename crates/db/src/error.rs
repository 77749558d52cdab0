use atelier_core::error::CoreError;

use crate::models::setting::BatchItemError;

/// Errors from repository operations that enforce domain rules inside a
/// transaction.
///
/// Plain CRUD methods return `sqlx::Error` directly; methods that validate
/// against locked rows before writing return this instead.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Core(#[from] CoreError),

    /// A batch was rejected as a whole; nothing was written.
    #[error("Batch rejected: {} item(s) failed", .0.len())]
    BatchRejected(Vec<BatchItemError>),
}
