//! Errors raised while building packets and identifiers.

use thiserror::Error;

/// Packet construction errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PacketError {
    /// A fixed-width field had the wrong length.
    #[error("Invalid {field} length: expected {expected}, got {actual}")]
    InvalidLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The same routing command appeared twice.
    #[error("Duplicate routing command: {0}")]
    DuplicateCommand(&'static str),

    /// Both a next hop and a local recipient were given.
    #[error("Packet has both a next hop and a recipient")]
    ConflictingDestination,

    /// Neither a next hop nor a local recipient was given.
    #[error("Packet has no destination")]
    MissingDestination,

    /// A SURB reply command without a recipient.
    #[error("SURB reply without a recipient")]
    OrphanSurbReply,

    /// `NodeDelay` above the protocol maximum.
    #[error("Node delay {0}ms exceeds the maximum")]
    DelayTooLarge(u32),
}
