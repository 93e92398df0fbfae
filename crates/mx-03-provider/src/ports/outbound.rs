//! Outbound (Driven) ports for the provider.
//!
//! The user directory and the spool are the `UserDirectoryApi` and `Spool`
//! ports of their own crates. The two traits here stand in for the rest of
//! the node.

use shared_types::{NodeId, Packet};

use crate::domain::errors::AckError;

/// The Sphinx engine, as far as SURB-ACKs are concerned.
pub trait SurbAckFactory: Send + Sync {
    /// Build a forward packet from `surb` carrying `payload`.
    ///
    /// # Returns
    /// The raw packet and the first hop it must be sent to.
    fn new_packet_from_surb(&self, surb: &[u8], payload: &[u8]) -> Result<(Vec<u8>, NodeId), AckError>;
}

/// The node's onward scheduler. Takes ownership of the packet.
pub trait PacketScheduler: Send + Sync {
    fn on_packet(&self, pkt: Packet);
}
