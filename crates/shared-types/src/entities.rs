//! # Identifier Entities
//!
//! Fixed-width byte identifiers used in routing commands, plus the
//! credential a link-layer handshake hands to the provider.

use serde::{Deserialize, Serialize};

use crate::constants::{NODE_ID_LENGTH, PUBLIC_KEY_LENGTH, RECIPIENT_ID_LENGTH, SURB_ID_LENGTH};
use crate::errors::PacketError;

/// Identifier of a mix node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub [u8; NODE_ID_LENGTH]);

/// Identifier of a SURB reply, chosen by the client that built the SURB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct SurbId(pub [u8; SURB_ID_LENGTH]);

impl SurbId {
    /// Create from a byte slice of exactly `SURB_ID_LENGTH` bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, PacketError> {
        let arr: [u8; SURB_ID_LENGTH] =
            bytes
                .try_into()
                .map_err(|_| PacketError::InvalidLength {
                    field: "surb_id",
                    expected: SURB_ID_LENGTH,
                    actual: bytes.len(),
                })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Recipient field of a packet destined for a local user.
///
/// The wire format is fixed-width; usernames shorter than the field are
/// padded with trailing NUL bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecipientId(pub [u8; RECIPIENT_ID_LENGTH]);

impl RecipientId {
    /// Build a padded recipient field from a username.
    pub fn from_username(username: &[u8]) -> Result<Self, PacketError> {
        if username.len() > RECIPIENT_ID_LENGTH {
            return Err(PacketError::InvalidLength {
                field: "recipient",
                expected: RECIPIENT_ID_LENGTH,
                actual: username.len(),
            });
        }
        let mut id = [0u8; RECIPIENT_ID_LENGTH];
        id[..username.len()].copy_from_slice(username);
        Ok(Self(id))
    }

    /// The logical recipient name: the field with trailing NULs removed.
    pub fn trimmed(&self) -> &[u8] {
        let end = self
            .0
            .iter()
            .rposition(|&b| b != 0)
            .map(|i| i + 1)
            .unwrap_or(0);
        &self.0[..end]
    }
}

impl std::fmt::Debug for RecipientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RecipientId({})", crate::printable::to_print_string(self.trimmed()))
    }
}

/// An X25519 public key as registered in the user directory.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey(pub [u8; PUBLIC_KEY_LENGTH]);

impl PublicKey {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, PacketError> {
        let arr: [u8; PUBLIC_KEY_LENGTH] =
            bytes
                .try_into()
                .map_err(|_| PacketError::InvalidLength {
                    field: "public_key",
                    expected: PUBLIC_KEY_LENGTH,
                    actual: bytes.len(),
                })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.0
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PublicKey({})", crate::printable::key_to_print_string(&self.0))
    }
}

/// Credentials of a peer that completed the link-layer handshake.
///
/// For client connections `additional_data` carries the claimed username.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerCredentials {
    pub additional_data: Vec<u8>,
    pub public_key: Vec<u8>,
}

impl PeerCredentials {
    pub fn new(additional_data: impl Into<Vec<u8>>, public_key: impl Into<Vec<u8>>) -> Self {
        Self {
            additional_data: additional_data.into(),
            public_key: public_key.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipient_trims_trailing_nuls() {
        let id = RecipientId::from_username(b"alice").unwrap();
        assert_eq!(id.trimmed(), b"alice");
    }

    #[test]
    fn test_recipient_keeps_interior_nuls() {
        let id = RecipientId::from_username(b"a\0b").unwrap();
        assert_eq!(id.trimmed(), b"a\0b");
    }

    #[test]
    fn test_recipient_all_nul_is_empty() {
        let id = RecipientId([0u8; RECIPIENT_ID_LENGTH]);
        assert!(id.trimmed().is_empty());
    }

    #[test]
    fn test_recipient_too_long() {
        let name = [b'x'; RECIPIENT_ID_LENGTH + 1];
        assert!(RecipientId::from_username(&name).is_err());
    }

    #[test]
    fn test_public_key_length_checked() {
        assert!(PublicKey::from_slice(&[1u8; 31]).is_err());
        assert!(PublicKey::from_slice(&[1u8; 32]).is_ok());
    }
}
