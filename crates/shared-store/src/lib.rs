//! # Shared Store
//!
//! The key-value persistence port used by the user directory and the spool.
//!
//! Keys live in named namespaces (column families in RocksDB terms). A store
//! is opened with the set of namespaces its owner needs; the adapter creates
//! any that are missing. Asking for a namespace that was not opened is
//! reported as [`StoreError::NamespaceMissing`], which owners treat as
//! corruption.
//!
//! ## Adapters
//!
//! | Adapter | Durability | Notes |
//! |---------|------------|-------|
//! | [`MemoryStore`] | none | tests, ephemeral nodes |
//! | [`FileStore`] | fsynced append per batch | no native dependencies, compacts itself |
//! | `RocksDbStore` | WAL, fsync per batch | feature `rocksdb` |
//!
//! Readers never wait on a writer's I/O: the memory and file adapters persist
//! a batch before taking a short write lock to apply it, RocksDB reads are
//! lock-free by construction.

pub mod adapters;
pub mod errors;
pub mod ports;

pub use adapters::{FileStore, FileStoreConfig, MemoryStore};
#[cfg(feature = "rocksdb")]
pub use adapters::{RocksDbConfig, RocksDbStore};
pub use errors::StoreError;
pub use ports::{BatchOperation, KeyValueStore, ScanResult};
