//! Namespaced tables shared by the memory and file adapters.
//!
//! Readers hold the read lock only while copying out what they asked for.
//! Writers are serialized by their adapter: a batch is checked under the read
//! lock, persisted, and only then applied under a short write lock, so
//! readers never wait on a writer's I/O.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::errors::StoreError;
use crate::ports::{BatchOperation, ScanResult};

type Table = BTreeMap<Vec<u8>, Vec<u8>>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Tables {
    namespaces: BTreeMap<String, Table>,
}

impl Tables {
    /// Create any missing namespace. Returns true if one was created.
    pub(crate) fn ensure_namespaces(&mut self, names: &[&str]) -> bool {
        let mut created = false;
        for name in names {
            if !self.namespaces.contains_key(*name) {
                self.namespaces.insert((*name).to_string(), Table::new());
                created = true;
            }
        }
        created
    }

    fn table(&self, namespace: &str) -> Result<&Table, StoreError> {
        self.namespaces
            .get(namespace)
            .ok_or_else(|| StoreError::NamespaceMissing {
                namespace: namespace.to_string(),
            })
    }

    pub(crate) fn get(&self, namespace: &str, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.table(namespace)?.get(key).cloned())
    }

    pub(crate) fn scan(
        &self,
        namespace: &str,
        prefix: &[u8],
        limit: usize,
    ) -> Result<ScanResult, StoreError> {
        let table = self.table(namespace)?;
        Ok(table
            .range::<[u8], _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(k, _)| k.starts_with(prefix))
            .take(limit)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    /// Fail if any operation names a namespace that does not exist.
    pub(crate) fn check(&self, operations: &[BatchOperation]) -> Result<(), StoreError> {
        for op in operations {
            self.table(op.namespace())?;
        }
        Ok(())
    }

    /// Apply a batch. Namespaces are checked up front so a failing batch
    /// leaves the tables untouched.
    pub(crate) fn apply(&mut self, operations: Vec<BatchOperation>) -> Result<(), StoreError> {
        self.check(&operations)?;
        for op in operations {
            match op {
                BatchOperation::Put {
                    namespace,
                    key,
                    value,
                } => {
                    if let Some(t) = self.namespaces.get_mut(&namespace) {
                        t.insert(key, value);
                    }
                }
                BatchOperation::Delete { namespace, key } => {
                    if let Some(t) = self.namespaces.get_mut(&namespace) {
                        t.remove(&key);
                    }
                }
            }
        }
        Ok(())
    }
}

/// Tables behind a reader-writer lock plus the closed flag.
///
/// Callers of `write` and `close` must hold their adapter's writer lock.
pub(crate) struct SharedTables {
    tables: RwLock<Tables>,
    closed: AtomicBool,
}

impl SharedTables {
    pub(crate) fn new(tables: Tables) -> Self {
        Self {
            tables: RwLock::new(tables),
            closed: AtomicBool::new(false),
        }
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }

    pub(crate) fn read<R, F>(&self, f: F) -> Result<R, StoreError>
    where
        F: FnOnce(&Tables) -> Result<R, StoreError>,
    {
        self.ensure_open()?;
        f(&self.tables.read())
    }

    /// Check `operations`, hand them to `persist`, and apply them in memory
    /// if that succeeds.
    pub(crate) fn write<F>(&self, operations: Vec<BatchOperation>, persist: F) -> Result<(), StoreError>
    where
        F: FnOnce(&[BatchOperation]) -> Result<(), StoreError>,
    {
        self.ensure_open()?;
        self.tables.read().check(&operations)?;
        persist(&operations)?;
        self.tables.write().apply(operations)
    }

    /// Mark closed. Returns false if it already was.
    pub(crate) fn close(&self) -> bool {
        !self.closed.swap(true, Ordering::AcqRel)
    }
}
