//! # Ports Layer
//!
//! - `inbound.rs` - Driving port (API used by the provider and operator tools)

pub mod inbound;
