//! # Ports Layer
//!
//! - `inbound.rs` - The `Spool` capability, implemented by every backend

pub mod inbound;
