use parking_lot::Mutex;

use crate::adapters::tables::{SharedTables, Tables};
use crate::errors::StoreError;
use crate::ports::{BatchOperation, KeyValueStore, ScanResult};

/// In-memory key-value store.
///
/// Same namespace and atomicity semantics as the durable adapters, nothing
/// survives the process.
pub struct MemoryStore {
    tables: SharedTables,
    writer: Mutex<()>,
}

impl MemoryStore {
    /// Create a store with the given namespaces.
    pub fn new(namespaces: &[&str]) -> Self {
        let mut tables = Tables::default();
        tables.ensure_namespaces(namespaces);
        Self {
            tables: SharedTables::new(tables),
            writer: Mutex::new(()),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, namespace: &str, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        self.tables.read(|t| t.get(namespace, key))
    }

    fn atomic_batch_write(&self, operations: Vec<BatchOperation>) -> Result<(), StoreError> {
        let _writer = self.writer.lock();
        self.tables.write(operations, |_| Ok(()))
    }

    fn prefix_scan(
        &self,
        namespace: &str,
        prefix: &[u8],
        limit: usize,
    ) -> Result<ScanResult, StoreError> {
        self.tables.read(|t| t.scan(namespace, prefix, limit))
    }

    fn flush(&self) -> Result<(), StoreError> {
        self.tables.read(|_| Ok(()))
    }

    fn close(&self) {
        let _writer = self.writer.lock();
        self.tables.close();
    }
}
