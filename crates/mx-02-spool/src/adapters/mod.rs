//! # Spool Adapters
//!
//! - `memory`: process-local queues
//! - `durable`: queues persisted through a `KeyValueStore`

mod durable;
mod memory;

pub use durable::DurableSpool;
pub use memory::MemorySpool;
