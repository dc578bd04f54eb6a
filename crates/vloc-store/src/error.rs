//! Store error types.

use thiserror::Error;
use vloc_models::StatusError;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error(transparent)]
    IllegalTransition(#[from] StatusError),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}
