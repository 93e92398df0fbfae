//! Durable key layout.
//!
//! ```text
//! metadata: "version"  -> [SCHEMA_VERSION]
//!           "next_seq" -> u64 big endian
//! spool:    len(user) || user || seq (u64 big endian) -> bincode(SpoolEntry)
//! ```
//!
//! The length byte keeps one user's prefix from matching another's, and
//! big-endian sequence numbers make key order equal insertion order.

use crate::domain::errors::SpoolError;

pub const METADATA_NAMESPACE: &str = "metadata";
pub const SPOOL_NAMESPACE: &str = "spool";
pub const NAMESPACES: &[&str] = &[METADATA_NAMESPACE, SPOOL_NAMESPACE];

pub const VERSION_KEY: &[u8] = b"version";
pub const NEXT_SEQ_KEY: &[u8] = b"next_seq";
pub const SCHEMA_VERSION: u8 = 0;

/// Longest user identifier that fits the length byte.
pub const MAX_USER_LENGTH: usize = u8::MAX as usize;

pub fn validate_user(user: &[u8]) -> Result<(), SpoolError> {
    if user.is_empty() || user.len() > MAX_USER_LENGTH {
        return Err(SpoolError::InvalidUser { length: user.len() });
    }
    Ok(())
}

/// Prefix shared by every entry of `user`.
pub fn user_prefix(user: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + user.len() + 8);
    key.push(user.len() as u8);
    key.extend_from_slice(user);
    key
}

pub fn entry_key(user: &[u8], seq: u64) -> Vec<u8> {
    let mut key = user_prefix(user);
    key.extend_from_slice(&seq.to_be_bytes());
    key
}

pub fn decode_seq(bytes: &[u8]) -> Result<u64, SpoolError> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| SpoolError::Codec(format!("next_seq has {} bytes", bytes.len())))?;
    Ok(u64::from_be_bytes(arr))
}
