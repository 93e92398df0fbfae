//! # Protocol Constants
//!
//! Widths of the identifiers carried in routing commands and the geometry of
//! the Sphinx packets the provider handles.

/// Length of a mix node identifier (hash of the node's identity key).
pub const NODE_ID_LENGTH: usize = 32;

/// Length of the fixed-width, NUL padded recipient field.
pub const RECIPIENT_ID_LENGTH: usize = 64;

/// Length of a SURB identifier.
pub const SURB_ID_LENGTH: usize = 16;

/// Length of an X25519 public key.
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// Length of the Sphinx header for the deployed path length.
pub const SPHINX_HEADER_LENGTH: usize = 476;

/// Key material appended to a SURB so the sender can decrypt the reply.
pub const SURB_KEY_MATERIAL_LENGTH: usize = 64;

/// Length of a single use reply block.
pub const SURB_LENGTH: usize = SPHINX_HEADER_LENGTH + NODE_ID_LENGTH + SURB_KEY_MATERIAL_LENGTH;

/// Length of the plaintext header that precedes the SURB in a user message
/// block: one flags byte and one reserved byte.
pub const PLAINTEXT_HEADER_LENGTH: usize = 2;

/// Fixed header length of a decoded user message block.
pub const MESSAGE_HEADER_LENGTH: usize = PLAINTEXT_HEADER_LENGTH + SURB_LENGTH;

/// Length of a forward Sphinx payload (what a SURB-ACK carries).
pub const FORWARD_PAYLOAD_LENGTH: usize = 2 * 1024;

/// Largest delay a `NodeDelay` command may request, in milliseconds.
pub const MAX_NODE_DELAY_MS: u32 = 6 * 60 * 60 * 1000;
