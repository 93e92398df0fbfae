//! # Provider Pipeline (mx-03)
//!
//! The provider is where client traffic enters and leaves the mix network.
//! Packets addressed to a local user are queued by the network layer, handled
//! one at a time by a dedicated worker, written to the recipient's spool and,
//! when the sender asked for it, acknowledged with a SURB-ACK handed back to
//! the node's scheduler.
//!
//! ## Packet States
//!
//! ```text
//! Received -> RecipientValidated -> Classified{SurbReply | UserMessage}
//!          -> Stored -> [AckSynthesized] -> Disposed
//! ```
//!
//! Every path ends in `Disposed`: the worker owns the packet and dropping it
//! wipes its buffers.
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Description |
//! |----|-----------|-------------|
//! | 1 | FIFO | Packets are dispatched in submission order |
//! | 2 | No Ack Without Store | A failed spool write never produces a SURB-ACK |
//! | 3 | Original Delay | A SURB-ACK inherits the delay and receipt time of its packet |
//! | 4 | Closed After Halt | No packet is accepted once `halt` has started |
//! | 5 | Ordered Teardown | drain, join worker, close spool, close directory |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Plaintext block codec, ack builder, config, stats, errors
//! - `ports/` - `ProviderApi` (inbound), `SurbAckFactory` / `PacketScheduler` (outbound)
//! - `service/` - `ProviderPipeline`, the dispatch worker and the drain barrier

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::ack::{ack_payload, build_ack_packet};
pub use domain::block::{BlockFlags, PlaintextBlock};
pub use domain::config::{ProviderConfig, QueuePolicy};
pub use domain::errors::{AckError, BlockError, ProviderError};
pub use domain::stats::{ProviderStats, StatsSnapshot};
pub use ports::inbound::ProviderApi;
pub use ports::outbound::{PacketScheduler, SurbAckFactory};
pub use service::{InFlight, ProviderPipeline};
