//! # Spool (mx-02)
//!
//! Per-recipient FIFO queues of delivered content awaiting retrieval by the
//! recipient's client. Two kinds of entry share a queue: plain message
//! ciphertexts and SURB replies tagged with their SURB identifier.
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Description |
//! |----|-----------|-------------|
//! | 1 | FIFO | Entries for a user come back in the order they were stored |
//! | 2 | Explicit Advance | An entry is removed only by `get(.., advance = true)` |
//! | 3 | Atomic Append | An entry and the sequence counter are written in one batch |
//! | 4 | Fail Closed | A durable spool with a foreign schema version refuses to open |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Entries, key layout, errors
//! - `ports/` - The `Spool` trait the provider writes to
//! - `adapters/` - `MemorySpool` and the store-backed `DurableSpool`

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::{DurableSpool, MemorySpool};
pub use domain::entities::{SpoolEntry, SpoolMessage};
pub use domain::errors::SpoolError;
pub use ports::inbound::Spool;
