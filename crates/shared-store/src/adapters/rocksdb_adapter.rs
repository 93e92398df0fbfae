//! # RocksDB Storage Adapter
//!
//! Production RocksDB implementation of the `KeyValueStore` port.
//!
//! ## Features
//!
//! - One column family per namespace
//! - Atomic batch writes (`WriteBatch`)
//! - Snappy compression
//! - fsync on write for durability
//!
//! The `RwLock` around the handle only guards `close`; reads and writes both
//! take the shared side, RocksDB does its own concurrency control.

use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use rocksdb::{ColumnFamilyDescriptor, Direction, IteratorMode, Options, WriteBatch, DB};

use crate::errors::StoreError;
use crate::ports::{BatchOperation, KeyValueStore, ScanResult};

/// RocksDB configuration.
#[derive(Debug, Clone)]
pub struct RocksDbConfig {
    /// Path to the database directory
    pub path: PathBuf,
    /// Write buffer size in bytes (default: 16MB)
    pub write_buffer_size: usize,
    /// Enable fsync after each write (default: true for durability)
    pub sync_writes: bool,
}

impl RocksDbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_buffer_size: 16 * 1024 * 1024,
            sync_writes: true,
        }
    }

    /// Config for testing (smaller buffers, no sync)
    pub fn for_testing(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_buffer_size: 1024 * 1024,
            sync_writes: false,
        }
    }
}

/// RocksDB-backed key-value store.
pub struct RocksDbStore {
    db: RwLock<Option<DB>>,
    config: RocksDbConfig,
}

impl RocksDbStore {
    /// Open or create a database with a column family per namespace.
    pub fn open(config: RocksDbConfig, namespaces: &[&str]) -> Result<Self, StoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_compression_type(rocksdb::DBCompressionType::Snappy);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = namespaces
            .iter()
            .map(|name| {
                let mut cf_opts = Options::default();
                cf_opts.set_compression_type(rocksdb::DBCompressionType::Snappy);
                ColumnFamilyDescriptor::new(*name, cf_opts)
            })
            .collect();

        let db = DB::open_cf_descriptors(&opts, &config.path, cf_descriptors).map_err(|e| {
            StoreError::Io {
                message: format!("Failed to open RocksDB: {}", e),
            }
        })?;

        Ok(Self {
            db: RwLock::new(Some(db)),
            config,
        })
    }

    /// Open with default tuning.
    pub fn open_default(path: impl AsRef<Path>, namespaces: &[&str]) -> Result<Self, StoreError> {
        Self::open(RocksDbConfig::new(path.as_ref()), namespaces)
    }

    fn write_options(&self) -> rocksdb::WriteOptions {
        let mut write_opts = rocksdb::WriteOptions::default();
        write_opts.set_sync(self.config.sync_writes);
        write_opts
    }
}

fn missing(namespace: &str) -> StoreError {
    StoreError::NamespaceMissing {
        namespace: namespace.to_string(),
    }
}

impl KeyValueStore for RocksDbStore {
    fn get(&self, namespace: &str, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let guard = self.db.read();
        let db = guard.as_ref().ok_or(StoreError::Closed)?;
        let cf = db.cf_handle(namespace).ok_or_else(|| missing(namespace))?;
        db.get_cf(cf, key).map_err(|e| StoreError::Io {
            message: format!("RocksDB get failed: {}", e),
        })
    }

    fn atomic_batch_write(&self, operations: Vec<BatchOperation>) -> Result<(), StoreError> {
        let guard = self.db.read();
        let db = guard.as_ref().ok_or(StoreError::Closed)?;
        let mut batch = WriteBatch::default();

        for op in operations {
            match op {
                BatchOperation::Put {
                    namespace,
                    key,
                    value,
                } => {
                    let cf = db.cf_handle(&namespace).ok_or_else(|| missing(&namespace))?;
                    batch.put_cf(cf, &key, &value);
                }
                BatchOperation::Delete { namespace, key } => {
                    let cf = db.cf_handle(&namespace).ok_or_else(|| missing(&namespace))?;
                    batch.delete_cf(cf, &key);
                }
            }
        }

        db.write_opt(batch, &self.write_options())
            .map_err(|e| StoreError::Io {
                message: format!("RocksDB batch write failed: {}", e),
            })
    }

    fn prefix_scan(
        &self,
        namespace: &str,
        prefix: &[u8],
        limit: usize,
    ) -> Result<ScanResult, StoreError> {
        let guard = self.db.read();
        let db = guard.as_ref().ok_or(StoreError::Closed)?;
        let cf = db.cf_handle(namespace).ok_or_else(|| missing(namespace))?;

        let mut results = Vec::new();
        for item in db.iterator_cf(cf, IteratorMode::From(prefix, Direction::Forward)) {
            if results.len() >= limit {
                break;
            }
            let (key, value) = item.map_err(|e| StoreError::Io {
                message: format!("RocksDB scan failed: {}", e),
            })?;
            if !key.starts_with(prefix) {
                break;
            }
            results.push((key.to_vec(), value.to_vec()));
        }
        Ok(results)
    }

    fn flush(&self) -> Result<(), StoreError> {
        let guard = self.db.read();
        let db = guard.as_ref().ok_or(StoreError::Closed)?;
        db.flush().map_err(|e| StoreError::Io {
            message: format!("RocksDB flush failed: {}", e),
        })
    }

    fn close(&self) {
        let mut guard = self.db.write();
        if let Some(db) = guard.take() {
            if let Err(e) = db.flush() {
                tracing::warn!("[store] RocksDB flush on close failed: {}", e);
            }
            tracing::debug!("[store] Closed {}", self.config.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_rocksdb_basic_operations() {
        let temp_dir = TempDir::new().unwrap();
        let config = RocksDbConfig::for_testing(temp_dir.path());
        let store = RocksDbStore::open(config, &["users"]).unwrap();

        store.put("users", b"key1", b"value1").unwrap();
        assert_eq!(store.get("users", b"key1").unwrap(), Some(b"value1".to_vec()));
        assert!(store.exists("users", b"key1").unwrap());

        store.delete("users", b"key1").unwrap();
        assert!(!store.exists("users", b"key1").unwrap());
    }

    #[test]
    fn test_rocksdb_missing_namespace() {
        let temp_dir = TempDir::new().unwrap();
        let store =
            RocksDbStore::open(RocksDbConfig::for_testing(temp_dir.path()), &["a"]).unwrap();
        assert!(matches!(
            store.get("b", b"k"),
            Err(StoreError::NamespaceMissing { .. })
        ));
    }

    #[test]
    fn test_rocksdb_prefix_scan() {
        let temp_dir = TempDir::new().unwrap();
        let store =
            RocksDbStore::open(RocksDbConfig::for_testing(temp_dir.path()), &["spool"]).unwrap();

        store.put("spool", b"u:0002", b"b").unwrap();
        store.put("spool", b"u:0001", b"a").unwrap();
        store.put("spool", b"v:0001", b"x").unwrap();

        let results = store.prefix_scan("spool", b"u:", 10).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].1, b"a".to_vec());
    }

    #[test]
    fn test_rocksdb_close_twice() {
        let temp_dir = TempDir::new().unwrap();
        let store =
            RocksDbStore::open(RocksDbConfig::for_testing(temp_dir.path()), &["a"]).unwrap();
        store.close();
        store.close();
        assert_eq!(store.get("a", b"k"), Err(StoreError::Closed));
    }
}
