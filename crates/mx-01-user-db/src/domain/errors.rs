//! User directory errors.

use shared_store::StoreError;
use thiserror::Error;

/// Errors returned by the user directory.
///
/// `is_valid` and `exists` never surface these; only `open`, `add` and
/// `remove` do.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserDbError {
    /// Username empty or longer than the configured maximum.
    #[error("userdb: invalid username (length {length}, maximum {max})")]
    InvalidUsername { length: usize, max: usize },

    /// The store was written by an incompatible version.
    #[error("userdb: incompatible version: {found:?}")]
    IncompatibleSchema { found: Vec<u8> },

    /// Storage failure.
    #[error("userdb: {0}")]
    Store(#[from] StoreError),
}
