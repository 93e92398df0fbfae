//! # Plaintext Block
//!
//! Layout of a decrypted user message payload:
//!
//! ```text
//! +-------+----------+---------------------+------------------+
//! | flags | reserved | SURB (SURB_LENGTH)  | ciphertext ...   |
//! +-------+----------+---------------------+------------------+
//!   1 B      1 B
//! ```
//!
//! The SURB region is present whatever the flags say; it only carries a
//! usable SURB when `flags == HasSurb`.

use shared_types::{MESSAGE_HEADER_LENGTH, PLAINTEXT_HEADER_LENGTH};

use crate::domain::errors::BlockError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BlockFlags {
    /// No SURB, no acknowledgement requested.
    Padding = 0,
    /// The SURB region holds a SURB for the acknowledgement.
    HasSurb = 1,
}

impl TryFrom<u8> for BlockFlags {
    type Error = BlockError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(BlockFlags::Padding),
            1 => Ok(BlockFlags::HasSurb),
            other => Err(BlockError::InvalidFlags(other)),
        }
    }
}

/// A decoded view into a packet payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaintextBlock<'a> {
    pub flags: BlockFlags,
    pub surb: Option<&'a [u8]>,
    pub ciphertext: &'a [u8],
}

impl<'a> PlaintextBlock<'a> {
    pub fn decode(payload: &'a [u8]) -> Result<Self, BlockError> {
        if payload.len() < MESSAGE_HEADER_LENGTH {
            return Err(BlockError::Truncated {
                length: payload.len(),
                minimum: MESSAGE_HEADER_LENGTH,
            });
        }
        if payload[1] != 0 {
            return Err(BlockError::InvalidReserved(payload[1]));
        }
        let flags = BlockFlags::try_from(payload[0])?;

        let surb_region = &payload[PLAINTEXT_HEADER_LENGTH..MESSAGE_HEADER_LENGTH];
        let surb = match flags {
            BlockFlags::HasSurb => Some(surb_region),
            BlockFlags::Padding => None,
        };

        Ok(Self {
            flags,
            surb,
            ciphertext: &payload[MESSAGE_HEADER_LENGTH..],
        })
    }

    /// Encode a block. Used by clients and tests; the provider only decodes.
    pub fn encode(flags: BlockFlags, surb: Option<&[u8]>, ciphertext: &[u8]) -> Vec<u8> {
        let mut out = vec![0u8; MESSAGE_HEADER_LENGTH];
        out[0] = flags as u8;
        if let Some(surb) = surb {
            let n = surb.len().min(MESSAGE_HEADER_LENGTH - PLAINTEXT_HEADER_LENGTH);
            out[PLAINTEXT_HEADER_LENGTH..PLAINTEXT_HEADER_LENGTH + n].copy_from_slice(&surb[..n]);
        }
        out.extend_from_slice(ciphertext);
        out
    }
}
