//! # Domain Layer
//!
//! - `block` - Plaintext block layout
//! - `ack` - SURB-ACK packet construction
//! - `config` - Pipeline configuration
//! - `stats` - Dispatch counters
//! - `errors` - Error types

pub mod ack;
pub mod block;
pub mod config;
pub mod errors;
pub mod stats;
