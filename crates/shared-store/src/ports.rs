//! # Store Port
//!
//! The interface the user directory and the spool require from a storage
//! engine. All methods take `&self`; adapters do their own locking so one
//! handle can be shared between the pipeline worker and connection threads.

use serde::{Deserialize, Serialize};

use crate::errors::StoreError;

/// Ordered `(key, value)` pairs returned by a prefix scan.
pub type ScanResult = Vec<(Vec<u8>, Vec<u8>)>;

/// Abstract interface for namespaced key-value operations.
///
/// Production: `FileStore` or `RocksDbStore`.
/// Testing: `MemoryStore`.
pub trait KeyValueStore: Send + Sync {
    /// Get a value by key.
    fn get(&self, namespace: &str, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Execute an atomic batch write.
    ///
    /// Either every operation is applied and durable, or none is.
    fn atomic_batch_write(&self, operations: Vec<BatchOperation>) -> Result<(), StoreError>;

    /// Return up to `limit` entries whose key starts with `prefix`, in
    /// ascending key order.
    fn prefix_scan(
        &self,
        namespace: &str,
        prefix: &[u8],
        limit: usize,
    ) -> Result<ScanResult, StoreError>;

    /// Flush buffered writes to stable storage.
    fn flush(&self) -> Result<(), StoreError>;

    /// Flush and release the store. Later calls fail with `Closed`; closing
    /// twice is a no-op.
    fn close(&self);

    /// Check if a key exists.
    fn exists(&self, namespace: &str, key: &[u8]) -> Result<bool, StoreError> {
        Ok(self.get(namespace, key)?.is_some())
    }

    /// Put a single key-value pair.
    fn put(&self, namespace: &str, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.atomic_batch_write(vec![BatchOperation::put(namespace, key, value)])
    }

    /// Delete a key.
    fn delete(&self, namespace: &str, key: &[u8]) -> Result<(), StoreError> {
        self.atomic_batch_write(vec![BatchOperation::delete(namespace, key)])
    }
}

/// Batch operation for atomic writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchOperation {
    /// Put a key-value pair.
    Put {
        namespace: String,
        key: Vec<u8>,
        value: Vec<u8>,
    },
    /// Delete a key.
    Delete { namespace: String, key: Vec<u8> },
}

impl BatchOperation {
    /// Create a Put operation.
    pub fn put(
        namespace: impl Into<String>,
        key: impl Into<Vec<u8>>,
        value: impl Into<Vec<u8>>,
    ) -> Self {
        BatchOperation::Put {
            namespace: namespace.into(),
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create a Delete operation.
    pub fn delete(namespace: impl Into<String>, key: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Delete {
            namespace: namespace.into(),
            key: key.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        match self {
            BatchOperation::Put { namespace, .. } | BatchOperation::Delete { namespace, .. } => {
                namespace
            }
        }
    }
}
