//! Store error type.

use keygate_core::EntityKey;

/// Errors raised by an [`EntityStore`](crate::EntityStore).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No entity is stored under the key.
    #[error("entity not found: {0}")]
    NotFound(EntityKey),

    /// The backend could not complete the operation.
    #[error("store backend failure: {0}")]
    Backend(String),
}
