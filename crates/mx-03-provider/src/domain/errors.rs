//! Provider error types.

use shared_types::PacketError;
use thiserror::Error;

/// Why a user message payload was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockError {
    #[error("Truncated message block: {length} < {minimum}")]
    Truncated { length: usize, minimum: usize },

    #[error("Invalid message reserved: 0x{0:02x}")]
    InvalidReserved(u8),

    #[error("Invalid message flags: 0x{0:02x}")]
    InvalidFlags(u8),
}

/// SURB-ACK synthesis failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AckError {
    /// No Sphinx engine is attached to this node.
    #[error("No packet engine available")]
    EngineUnavailable,

    /// The engine could not use the SURB.
    #[error("Invalid SURB: {0}")]
    InvalidSurb(String),

    /// The derived packet did not form a valid forward packet.
    #[error("Invalid ack packet: {0}")]
    Packet(#[from] PacketError),
}

/// Errors surfaced to callers of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The pipeline is halting or halted.
    #[error("Provider is halted")]
    Halted,

    /// The bounded dispatch queue is full.
    #[error("Provider queue full (capacity {capacity})")]
    QueueFull { capacity: usize },

    /// The worker thread could not be started.
    #[error("Failed to spawn provider worker: {0}")]
    Spawn(String),
}
