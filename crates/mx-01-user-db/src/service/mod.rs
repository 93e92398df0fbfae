//! # User Directory Service
//!
//! `UserDirectory` implements `UserDirectoryApi` on top of any
//! `KeyValueStore`. Concurrency comes from the store: reads never wait for a
//! writer's I/O and writes are serialized inside the store.


use std::path::Path;

use shared_store::{FileStore, KeyValueStore, MemoryStore, StoreError};
use shared_types::{key_to_print_string, to_print_string, PublicKey};

use crate::domain::credentials::{keys_match, UserDbConfig};
use crate::domain::errors::UserDbError;
use crate::domain::schema::{
    check_version, VersionCheck, METADATA_NAMESPACE, NAMESPACES, SCHEMA_VERSION, USERS_NAMESPACE,
    VERSION_KEY,
};
use crate::ports::inbound::UserDirectoryApi;

/// The user directory.
pub struct UserDirectory<S: KeyValueStore> {
    store: S,
    config: UserDbConfig,
}

impl<S: KeyValueStore> UserDirectory<S> {
    /// Attach to an opened store, writing the schema marker if the store is
    /// new and verifying it otherwise.
    ///
    /// The store must have been opened with [`NAMESPACES`]. On error the store
    /// is closed before returning.
    pub fn open(store: S, config: UserDbConfig) -> Result<Self, UserDbError> {
        if let Err(e) = Self::initialize(&store) {
            store.close();
            return Err(e);
        }
        Ok(Self { store, config })
    }

    fn initialize(store: &S) -> Result<(), UserDbError> {
        let stored = store.get(METADATA_NAMESPACE, VERSION_KEY)?;
        match check_version(stored) {
            VersionCheck::Compatible => {
                tracing::debug!("[userdb] Loaded existing directory");
                Ok(())
            }
            VersionCheck::Absent => {
                tracing::info!("[userdb] Initializing new directory (schema {})", SCHEMA_VERSION);
                store.put(METADATA_NAMESPACE, VERSION_KEY, &[SCHEMA_VERSION])?;
                Ok(())
            }
            VersionCheck::Incompatible(found) => {
                tracing::error!("[userdb] Incompatible schema version: {:?}", found);
                Err(UserDbError::IncompatibleSchema { found })
            }
        }
    }

    pub fn config(&self) -> &UserDbConfig {
        &self.config
    }

    /// Look up a user's stored key.
    ///
    /// # Panics
    ///
    /// If the `users` namespace has vanished: the directory is corrupt and
    /// answering would mean guessing.
    fn lookup(&self, username: &[u8]) -> Option<Vec<u8>> {
        match self.store.get(USERS_NAMESPACE, username) {
            Ok(value) => value,
            Err(StoreError::NamespaceMissing { .. }) => {
                panic!("BUG: userdb: `users` namespace is missing")
            }
            Err(e) => {
                tracing::debug!("[userdb] Lookup failed: {}", e);
                None
            }
        }
    }

    fn check_username(&self, username: &[u8]) -> Result<(), UserDbError> {
        if self.config.is_valid_username(username) {
            Ok(())
        } else {
            Err(UserDbError::InvalidUsername {
                length: username.len(),
                max: self.config.max_username_len,
            })
        }
    }

    fn write(&self, result: Result<(), StoreError>) -> Result<(), UserDbError> {
        match result {
            Err(StoreError::NamespaceMissing { .. }) => {
                panic!("BUG: userdb: `users` namespace is missing")
            }
            other => other.map_err(UserDbError::from),
        }
    }
}

impl UserDirectory<FileStore> {
    /// Open (or create) a file-backed directory.
    pub fn open_file<P: AsRef<Path>>(path: P, config: UserDbConfig) -> Result<Self, UserDbError> {
        let store = FileStore::open(path, NAMESPACES)?;
        Self::open(store, config)
    }
}

impl UserDirectory<MemoryStore> {
    /// Create an ephemeral directory.
    pub fn open_memory(config: UserDbConfig) -> Result<Self, UserDbError> {
        Self::open(MemoryStore::new(NAMESPACES), config)
    }
}

#[cfg(feature = "rocksdb")]
impl UserDirectory<shared_store::RocksDbStore> {
    /// Open (or create) a RocksDB-backed directory.
    pub fn open_rocksdb<P: AsRef<Path>>(path: P, config: UserDbConfig) -> Result<Self, UserDbError> {
        let store = shared_store::RocksDbStore::open_default(path, NAMESPACES)?;
        Self::open(store, config)
    }
}

impl<S: KeyValueStore> UserDirectoryApi for UserDirectory<S> {
    fn is_valid(&self, username: &[u8], public_key: &[u8]) -> bool {
        // Reject pathologically malformed arguments.
        if !self.config.is_valid_username(username) || public_key.is_empty() {
            return false;
        }

        match self.lookup(username) {
            Some(stored) => keys_match(&stored, public_key),
            None => false,
        }
    }

    fn exists(&self, username: &[u8]) -> bool {
        if !self.config.is_valid_username(username) {
            return false;
        }
        self.lookup(username).is_some()
    }

    fn add(&self, username: &[u8], public_key: &PublicKey) -> Result<(), UserDbError> {
        self.check_username(username)?;
        self.write(
            self.store
                .put(USERS_NAMESPACE, username, public_key.as_bytes()),
        )?;
        tracing::debug!(
            "[userdb] Added user '{}' ({})",
            to_print_string(username),
            key_to_print_string(public_key.as_bytes())
        );
        Ok(())
    }

    fn remove(&self, username: &[u8]) -> Result<(), UserDbError> {
        self.check_username(username)?;
        self.write(self.store.delete(USERS_NAMESPACE, username))?;
        tracing::debug!("[userdb] Removed user '{}'", to_print_string(username));
        Ok(())
    }

    fn close(&self) {
        if let Err(e) = self.store.flush() {
            if e != StoreError::Closed {
                tracing::warn!("[userdb] Flush on close failed: {}", e);
            }
        }
        self.store.close();
    }
}
