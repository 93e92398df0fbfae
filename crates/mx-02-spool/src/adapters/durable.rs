//! Store-backed spool.
//!
//! Entries are keyed by `(user, seq)` with a single process-wide sequence
//! counter persisted next to the entries. See `domain::keys` for the layout.

use std::path::Path;

use parking_lot::Mutex;
use shared_store::{BatchOperation, FileStore, KeyValueStore, MemoryStore, StoreError};
use shared_types::{to_print_string, SurbId};

use crate::domain::entities::{SpoolEntry, SpoolMessage};
use crate::domain::errors::SpoolError;
use crate::domain::keys::{
    decode_seq, entry_key, user_prefix, validate_user, METADATA_NAMESPACE, NAMESPACES,
    NEXT_SEQ_KEY, SCHEMA_VERSION, SPOOL_NAMESPACE, VERSION_KEY,
};
use crate::ports::inbound::Spool;

/// Spool persisted through a [`KeyValueStore`].
pub struct DurableSpool<S: KeyValueStore> {
    store: S,
    /// Next sequence number. Held for the whole append so entries and the
    /// counter move together.
    next_seq: Mutex<u64>,
}

impl<S: KeyValueStore> DurableSpool<S> {
    /// Attach to a store opened with [`NAMESPACES`]. On error the store is
    /// closed before returning.
    pub fn open(store: S) -> Result<Self, SpoolError> {
        match Self::initialize(&store) {
            Ok(next_seq) => Ok(Self {
                store,
                next_seq: Mutex::new(next_seq),
            }),
            Err(e) => {
                store.close();
                Err(e)
            }
        }
    }

    fn initialize(store: &S) -> Result<u64, SpoolError> {
        match store.get(METADATA_NAMESPACE, VERSION_KEY)? {
            None => {
                tracing::info!("[spool] Initializing new spool (schema {})", SCHEMA_VERSION);
                store.atomic_batch_write(vec![
                    BatchOperation::put(METADATA_NAMESPACE, VERSION_KEY, vec![SCHEMA_VERSION]),
                    BatchOperation::put(METADATA_NAMESPACE, NEXT_SEQ_KEY, 0u64.to_be_bytes()),
                ])?;
                Ok(0)
            }
            Some(found) if found.as_slice() == [SCHEMA_VERSION] => {
                let next_seq = match store.get(METADATA_NAMESPACE, NEXT_SEQ_KEY)? {
                    Some(bytes) => decode_seq(&bytes)?,
                    None => 0,
                };
                tracing::debug!("[spool] Loaded existing spool (next seq {})", next_seq);
                Ok(next_seq)
            }
            Some(found) => {
                tracing::error!("[spool] Incompatible schema version: {:?}", found);
                Err(SpoolError::IncompatibleSchema { found })
            }
        }
    }

    fn append(&self, user: &[u8], entry: &SpoolEntry) -> Result<(), SpoolError> {
        validate_user(user)?;
        let value = bincode::serialize(entry).map_err(|e| SpoolError::Codec(e.to_string()))?;

        let mut next_seq = self.next_seq.lock();
        let seq = *next_seq;
        self.store.atomic_batch_write(vec![
            BatchOperation::put(SPOOL_NAMESPACE, entry_key(user, seq), value),
            BatchOperation::put(METADATA_NAMESPACE, NEXT_SEQ_KEY, (seq + 1).to_be_bytes()),
        ])?;
        *next_seq = seq + 1;

        tracing::trace!("[spool] Appended entry {} for '{}'", seq, to_print_string(user));
        Ok(())
    }

    fn decode(value: &[u8]) -> Result<SpoolMessage, SpoolError> {
        let entry: SpoolEntry =
            bincode::deserialize(value).map_err(|e| SpoolError::Codec(e.to_string()))?;
        Ok(entry.into())
    }
}

impl DurableSpool<FileStore> {
    /// Open (or create) a file-backed spool.
    pub fn open_file<P: AsRef<Path>>(path: P) -> Result<Self, SpoolError> {
        Self::open(FileStore::open(path, NAMESPACES)?)
    }
}

impl DurableSpool<MemoryStore> {
    /// Spool over an in-memory store. Exercises the durable code path in
    /// tests without touching disk.
    pub fn open_memory() -> Result<Self, SpoolError> {
        Self::open(MemoryStore::new(NAMESPACES))
    }
}

#[cfg(feature = "rocksdb")]
impl DurableSpool<shared_store::RocksDbStore> {
    /// Open (or create) a RocksDB-backed spool.
    pub fn open_rocksdb<P: AsRef<Path>>(path: P) -> Result<Self, SpoolError> {
        Self::open(shared_store::RocksDbStore::open_default(path, NAMESPACES)?)
    }
}

impl<S: KeyValueStore> Spool for DurableSpool<S> {
    fn store_message(&self, user: &[u8], msg: &[u8]) -> Result<(), SpoolError> {
        self.append(user, &SpoolEntry::Message(msg.to_vec()))
    }

    fn store_surb_reply(&self, user: &[u8], id: &SurbId, msg: &[u8]) -> Result<(), SpoolError> {
        self.append(
            user,
            &SpoolEntry::SurbReply {
                id: *id,
                payload: msg.to_vec(),
            },
        )
    }

    fn get(&self, user: &[u8], advance: bool) -> Result<Option<SpoolMessage>, SpoolError> {
        validate_user(user)?;
        let prefix = user_prefix(user);

        if !advance {
            let head = self.store.prefix_scan(SPOOL_NAMESPACE, &prefix, 1)?;
            return head.first().map(|(_, v)| Self::decode(v)).transpose();
        }

        // Serialize with appends so the deleted head is the one we scanned.
        let _guard = self.next_seq.lock();
        let head = self.store.prefix_scan(SPOOL_NAMESPACE, &prefix, 2)?;
        let mut entries = head.into_iter();
        if let Some((key, _)) = entries.next() {
            self.store.delete(SPOOL_NAMESPACE, &key)?;
        }
        entries.next().map(|(_, v)| Self::decode(&v)).transpose()
    }

    fn close(&self) {
        if let Err(e) = self.store.flush() {
            if e != StoreError::Closed {
                tracing::warn!("[spool] Flush on close failed: {}", e);
            }
        }
        self.store.close();
    }
}
