//! Spool errors.

use shared_store::StoreError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpoolError {
    /// User identifier empty or too long to key.
    #[error("spool: invalid user (length {length})")]
    InvalidUser { length: usize },

    /// The durable spool was written by an incompatible version.
    #[error("spool: incompatible version: {found:?}")]
    IncompatibleSchema { found: Vec<u8> },

    /// A stored entry could not be decoded.
    #[error("spool: corrupt entry: {0}")]
    Codec(String),

    /// Storage failure.
    #[error("spool: {0}")]
    Store(#[from] StoreError),

    /// The spool has been closed.
    #[error("spool: closed")]
    Closed,
}
