//! # Store Adapters
//!
//! - `memory`: process-local tables
//! - `file`: append-only log of batches, compacted into an image
//! - `rocksdb_adapter`: production backend (feature `rocksdb`)

mod file;
mod memory;
#[cfg(feature = "rocksdb")]
mod rocksdb_adapter;
mod tables;

pub use file::{FileStore, FileStoreConfig};
pub use memory::MemoryStore;
#[cfg(feature = "rocksdb")]
pub use rocksdb_adapter::{RocksDbConfig, RocksDbStore};
