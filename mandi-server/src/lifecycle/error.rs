//! Lifecycle error types
//!
//! Every command handler returns `LifecycleError`. Validation, Forbidden,
//! NotFound and StateConflict abort the transition before any mutation is
//! committed; Storage and Internal indicate faults rather than rejections.

use thiserror::Error;

use crate::storage::StorageError;
use crate::utils::AppError;

#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Malformed or out-of-range input
    #[error("{0}")]
    Validation(String),

    /// Authenticated actor lacks the required role or party
    #[error("{0}")]
    Forbidden(String),

    /// Referenced entity does not exist
    #[error("{0}")]
    NotFound(String),

    /// Entity is not in the state the transition requires
    #[error("{0}")]
    StateConflict(String),

    /// Storage layer fault
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Anything else that should never happen
    #[error("{0}")]
    Internal(String),
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;

impl From<LifecycleError> for AppError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::Validation(msg) => AppError::Validation(msg),
            LifecycleError::Forbidden(msg) => AppError::Forbidden(msg),
            LifecycleError::NotFound(msg) => AppError::NotFound(msg),
            LifecycleError::StateConflict(msg) => AppError::Conflict(msg),
            LifecycleError::Storage(err) => AppError::Internal(err.to_string()),
            LifecycleError::Internal(msg) => AppError::Internal(msg),
        }
    }
}
