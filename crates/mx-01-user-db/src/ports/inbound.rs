//! # Inbound Port
//!
//! The user directory API. The provider pipeline uses `exists`, link-layer
//! connection handlers use `is_valid` (from many threads at once), operator
//! tooling uses `add` and `remove`.

use shared_types::PublicKey;

use crate::domain::errors::UserDbError;

/// User directory operations.
pub trait UserDirectoryApi: Send + Sync {
    /// Whether `username` is registered with exactly `public_key`.
    ///
    /// Malformed arguments, unknown users and storage errors all yield
    /// `false`; callers cannot tell which.
    fn is_valid(&self, username: &[u8], public_key: &[u8]) -> bool;

    /// Whether `username` is registered at all.
    fn exists(&self, username: &[u8]) -> bool;

    /// Register `username`, replacing any existing key.
    fn add(&self, username: &[u8], public_key: &PublicKey) -> Result<(), UserDbError>;

    /// Forget `username`. Removing an unknown user is not an error.
    fn remove(&self, username: &[u8]) -> Result<(), UserDbError>;

    /// Flush and release the backing store.
    fn close(&self);
}
