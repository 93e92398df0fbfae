//! # Ports Layer
//!
//! - `inbound.rs` - What the network layer calls
//! - `outbound.rs` - What the pipeline needs from the crypto engine and scheduler

pub mod inbound;
pub mod outbound;
