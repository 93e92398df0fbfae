//! Store error types.

use thiserror::Error;

/// Errors reported by key-value store adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The namespace was not created when the store was opened.
    #[error("Namespace missing: {namespace}")]
    NamespaceMissing { namespace: String },

    /// Underlying I/O failure.
    #[error("Store I/O error: {message}")]
    Io { message: String },

    /// On-disk data could not be decoded.
    #[error("Store corrupted: {message}")]
    Corrupted { message: String },

    /// The store has been closed.
    #[error("Store is closed")]
    Closed,
}

impl StoreError {
    pub(crate) fn io(e: impl std::fmt::Display) -> Self {
        StoreError::Io {
            message: e.to_string(),
        }
    }
}
