//! Username bounds and key comparison.

use shared_types::RECIPIENT_ID_LENGTH;
use subtle::ConstantTimeEq;

/// User directory configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDbConfig {
    /// Longest username accepted, in bytes.
    pub max_username_len: usize,
}

impl Default for UserDbConfig {
    fn default() -> Self {
        Self {
            max_username_len: RECIPIENT_ID_LENGTH,
        }
    }
}

impl UserDbConfig {
    /// A username is well formed if it is non-empty and within the bound.
    pub fn is_valid_username(&self, username: &[u8]) -> bool {
        !username.is_empty() && username.len() <= self.max_username_len
    }
}

/// Compare a stored key against a presented one.
///
/// Runs in time independent of the key contents. Lengths are not secret
/// (every registered key is `PUBLIC_KEY_LENGTH` bytes), so a length mismatch
/// may return immediately.
pub fn keys_match(stored: &[u8], presented: &[u8]) -> bool {
    stored.ct_eq(presented).into()
}
