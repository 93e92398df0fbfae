//! Inbound (Driving) port for the provider.

use shared_types::{Packet, PeerCredentials};

use crate::domain::errors::ProviderError;
use crate::domain::stats::StatsSnapshot;

/// Provider entry points used by the network layer.
pub trait ProviderApi: Send + Sync {
    /// Queue a packet for dispatch and return immediately.
    ///
    /// # Returns
    /// - `Ok(())`: the packet will be dispatched
    /// - `Err(Halted)` / `Err(QueueFull)`: the packet was refused and disposed
    fn on_packet(&self, pkt: Packet) -> Result<(), ProviderError>;

    /// Check a client's link credentials against the user directory.
    ///
    /// Runs on the caller's thread and may be called concurrently.
    fn authenticate_client(&self, creds: &PeerCredentials) -> bool;

    /// Stop accepting packets, drain, and close storage. Idempotent.
    fn halt(&self);

    fn stats(&self) -> StatsSnapshot;
}
