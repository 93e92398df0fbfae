//! Append-only log store.
//!
//! ## Format
//!
//! A five byte header (`MXKV` and a format byte) followed by frames:
//!
//! | Field | Size |
//! |-------|------|
//! | payload length (LE) | 4 |
//! | CRC32 of payload (LE) | 4 |
//! | bincode `LogRecord` | length |
//!
//! A record is either a full image of the tables or one batch. Replay starts
//! from the last image and applies the batches after it. A frame cut short by
//! a crash can only be the last one; it is dropped on open. A bad frame with
//! more data after it is corruption.

use std::borrow::Cow;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::adapters::tables::{SharedTables, Tables};
use crate::errors::StoreError;
use crate::ports::{BatchOperation, KeyValueStore, ScanResult};

const MAGIC: &[u8; 4] = b"MXKV";
const FORMAT: u8 = 2;
const HEADER_LEN: usize = MAGIC.len() + 1;
const FRAME_HEADER_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStoreConfig {
    /// The log is rewritten as a single image once the bytes appended since
    /// the last rewrite exceed both this and the size of that rewrite.
    pub compact_min_bytes: u64,
}

impl Default for FileStoreConfig {
    fn default() -> Self {
        Self {
            compact_min_bytes: 4 * 1024 * 1024,
        }
    }
}

#[derive(Serialize, Deserialize)]
enum LogRecord<'a> {
    Image(Cow<'a, Tables>),
    Batch(Cow<'a, [BatchOperation]>),
}

struct LogFile {
    file: File,
    len: u64,
    compacted_len: u64,
}

impl LogFile {
    fn open(path: &Path) -> Result<Self, StoreError> {
        let file = OpenOptions::new()
            .append(true)
            .open(path)
            .map_err(StoreError::io)?;
        let len = file.metadata().map_err(StoreError::io)?.len();
        Ok(Self {
            file,
            len,
            compacted_len: len,
        })
    }

    fn append(&mut self, frame: &[u8]) -> Result<(), StoreError> {
        let written = self
            .file
            .write_all(frame)
            .and_then(|()| self.file.sync_data());
        if let Err(e) = written {
            // Cut off whatever part of the frame made it to the file.
            let _ = self.file.set_len(self.len);
            return Err(StoreError::io(e));
        }
        self.len += frame.len() as u64;
        Ok(())
    }

    fn needs_compaction(&self, min_bytes: u64) -> bool {
        self.len - self.compacted_len > min_bytes.max(self.compacted_len)
    }
}

/// File-backed key-value store for nodes built without RocksDB.
///
/// Each batch is appended as one fsynced frame, so the cost of a write does
/// not depend on how much is already stored. The log is compacted into a
/// fresh image (temp file, fsync, rename) once it has grown past the size of
/// the previous image.
pub struct FileStore {
    tables: SharedTables,
    log: Mutex<LogFile>,
    path: PathBuf,
    config: FileStoreConfig,
}

impl FileStore {
    /// Open (or create) the store at `path`, creating missing namespaces.
    ///
    /// An existing file that cannot be decoded is an error; it is never
    /// silently replaced.
    pub fn open<P: AsRef<Path>>(path: P, namespaces: &[&str]) -> Result<Self, StoreError> {
        Self::open_with_config(path, namespaces, FileStoreConfig::default())
    }

    pub fn open_with_config<P: AsRef<Path>>(
        path: P,
        namespaces: &[&str],
        config: FileStoreConfig,
    ) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let (mut tables, mut rewrite) = match read_existing(&path)? {
            Some(bytes) => {
                let replayed = replay(&path, &bytes)?;
                if let Some(offset) = replayed.torn_at {
                    tracing::warn!(
                        "[store] Dropping incomplete record at offset {} of {}",
                        offset,
                        path.display()
                    );
                }
                tracing::debug!("[store] Loaded {}", path.display());
                (replayed.tables, replayed.torn_at.is_some())
            }
            None => {
                tracing::info!("[store] Creating {}", path.display());
                (Tables::default(), true)
            }
        };

        if tables.ensure_namespaces(namespaces) {
            rewrite = true;
        }
        if rewrite {
            write_image(&path, &tables)?;
        }

        Ok(Self {
            tables: SharedTables::new(tables),
            log: Mutex::new(LogFile::open(&path)?),
            path,
            config,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrite the log as a single image now.
    pub fn compact(&self) -> Result<(), StoreError> {
        let mut log = self.log.lock();
        self.compact_locked(&mut log)
    }

    fn compact_locked(&self, log: &mut LogFile) -> Result<(), StoreError> {
        let before = log.len;
        self.tables.read(|tables| write_image(&self.path, tables))?;
        *log = LogFile::open(&self.path)?;
        tracing::debug!(
            "[store] Compacted {} ({} -> {} bytes)",
            self.path.display(),
            before,
            log.len
        );
        Ok(())
    }
}

fn read_existing(path: &Path) -> Result<Option<Vec<u8>>, StoreError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::io(e)),
    }
}

struct Replayed {
    tables: Tables,
    torn_at: Option<usize>,
}

fn replay(path: &Path, bytes: &[u8]) -> Result<Replayed, StoreError> {
    let corrupted = |message: String| StoreError::Corrupted {
        message: format!("{}: {}", path.display(), message),
    };

    if bytes.len() < HEADER_LEN || &bytes[..MAGIC.len()] != MAGIC {
        return Err(corrupted("bad magic".to_string()));
    }
    if bytes[MAGIC.len()] != FORMAT {
        return Err(corrupted(format!("unknown format {}", bytes[MAGIC.len()])));
    }

    let mut tables = Tables::default();
    let mut pos = HEADER_LEN;
    while pos < bytes.len() {
        let rest = &bytes[pos..];
        if rest.len() < FRAME_HEADER_LEN {
            return Ok(Replayed {
                tables,
                torn_at: Some(pos),
            });
        }
        let len = le_u32(&rest[0..4]) as usize;
        let crc = le_u32(&rest[4..8]);
        let end = FRAME_HEADER_LEN.saturating_add(len);
        if rest.len() < end {
            return Ok(Replayed {
                tables,
                torn_at: Some(pos),
            });
        }

        let payload = &rest[FRAME_HEADER_LEN..end];
        if crc32fast::hash(payload) != crc {
            if end == rest.len() {
                return Ok(Replayed {
                    tables,
                    torn_at: Some(pos),
                });
            }
            return Err(corrupted(format!("checksum mismatch at offset {}", pos)));
        }

        let record: LogRecord<'static> = bincode::deserialize(payload)
            .map_err(|e| corrupted(format!("offset {}: {}", pos, e)))?;
        match record {
            LogRecord::Image(image) => tables = image.into_owned(),
            LogRecord::Batch(ops) => tables
                .apply(ops.into_owned())
                .map_err(|e| corrupted(format!("offset {}: {}", pos, e)))?,
        }
        pos += end;
    }

    Ok(Replayed {
        tables,
        torn_at: None,
    })
}

fn le_u32(bytes: &[u8]) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[..4]);
    u32::from_le_bytes(raw)
}

fn encode_frame(record: &LogRecord<'_>) -> Result<Vec<u8>, StoreError> {
    let payload = bincode::serialize(record).map_err(StoreError::io)?;
    let len = u32::try_from(payload.len()).map_err(|_| StoreError::Io {
        message: format!("record of {} bytes is too large", payload.len()),
    })?;

    let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + payload.len());
    frame.extend_from_slice(&len.to_le_bytes());
    frame.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Replace the file at `path` with a header and a single image frame.
fn write_image(path: &Path, tables: &Tables) -> Result<(), StoreError> {
    let frame = encode_frame(&LogRecord::Image(Cow::Borrowed(tables)))?;

    // Write atomically via temp file
    let temp_path = path.with_extension("tmp");
    let mut file = open_private(&temp_path)?;
    file.write_all(MAGIC).map_err(StoreError::io)?;
    file.write_all(&[FORMAT]).map_err(StoreError::io)?;
    file.write_all(&frame).map_err(StoreError::io)?;
    file.sync_all().map_err(StoreError::io)?;
    fs::rename(&temp_path, path).map_err(StoreError::io)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Ok(dir) = File::open(parent) {
            let _ = dir.sync_all();
        }
    }
    Ok(())
}

#[cfg(unix)]
fn open_private(path: &Path) -> Result<File, StoreError> {
    use std::os::unix::fs::OpenOptionsExt;
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
        .map_err(StoreError::io)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> Result<File, StoreError> {
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .map_err(StoreError::io)
}

impl KeyValueStore for FileStore {
    fn get(&self, namespace: &str, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        self.tables.read(|t| t.get(namespace, key))
    }

    fn atomic_batch_write(&self, operations: Vec<BatchOperation>) -> Result<(), StoreError> {
        let mut log = self.log.lock();
        self.tables.write(operations, |ops| {
            let frame = encode_frame(&LogRecord::Batch(Cow::Borrowed(ops)))?;
            log.append(&frame)
        })?;

        if log.needs_compaction(self.config.compact_min_bytes) {
            if let Err(e) = self.compact_locked(&mut log) {
                tracing::warn!("[store] Compaction of {} failed: {}", self.path.display(), e);
                log.compacted_len = log.len;
            }
        }
        Ok(())
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
        // Every frame is already fsynced before it is applied.
        self.tables.read(|_| Ok(()))
    }

    fn close(&self) {
        let _log = self.log.lock();
        if self.tables.close() {
            tracing::debug!("[store] Closed {}", self.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn file_len(path: &Path) -> u64 {
        fs::metadata(path).unwrap().len()
    }

    #[test]
    fn test_file_store_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kv.db");

        let store = FileStore::open(&path, &["users"]).unwrap();
        store.put("users", b"alice", b"key").unwrap();
        store.put("users", b"bob", b"key2").unwrap();
        store.delete("users", b"bob").unwrap();
        store.close();

        let store = FileStore::open(&path, &["users"]).unwrap();
        assert_eq!(store.get("users", b"alice").unwrap(), Some(b"key".to_vec()));
        assert_eq!(store.get("users", b"bob").unwrap(), None);
    }

    #[test]
    fn test_file_store_adds_namespaces_on_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kv.db");

        FileStore::open(&path, &["a"]).unwrap().close();
        let store = FileStore::open(&path, &["a", "b"]).unwrap();
        store.put("b", b"k", b"v").unwrap();
        assert_eq!(store.get("b", b"k").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn test_file_store_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kv.db");
        fs::write(&path, b"definitely not a store").unwrap();

        assert!(matches!(
            FileStore::open(&path, &["a"]),
            Err(StoreError::Corrupted { .. })
        ));
    }

    #[test]
    fn test_file_store_batch_is_atomic_on_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kv.db");

        let store = FileStore::open(&path, &["a"]).unwrap();
        let len = file_len(&path);
        let ops = vec![
            BatchOperation::put("a", b"1", b"one"),
            BatchOperation::put("nope", b"2", b"two"),
        ];
        assert!(store.atomic_batch_write(ops).is_err());
        assert_eq!(file_len(&path), len);
        store.close();

        let store = FileStore::open(&path, &["a"]).unwrap();
        assert_eq!(store.get("a", b"1").unwrap(), None);
    }

    #[test]
    fn test_write_cost_independent_of_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kv.db");
        let store = FileStore::open(&path, &["a"]).unwrap();
        let value = vec![7u8; 2048];

        for i in 0u32..500 {
            let before = file_len(&path);
            store.put("a", &i.to_be_bytes(), &value).unwrap();
            let grown = file_len(&path) - before;
            assert!(grown < 2048 + 256, "write {} grew the file by {}", i, grown);
        }
        assert_eq!(store.prefix_scan("a", b"", usize::MAX).unwrap().len(), 500);
    }

    #[test]
    fn test_incomplete_tail_dropped_on_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kv.db");

        let store = FileStore::open(&path, &["a"]).unwrap();
        store.put("a", b"k1", b"v1").unwrap();
        store.close();
        drop(store);

        // A frame header promising more bytes than follow.
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(&[0x40, 0, 0, 0, 1, 2, 3, 4, 5]).unwrap();
        drop(file);

        let store = FileStore::open(&path, &["a"]).unwrap();
        assert_eq!(store.get("a", b"k1").unwrap(), Some(b"v1".to_vec()));
        store.put("a", b"k2", b"v2").unwrap();
        store.close();

        let store = FileStore::open(&path, &["a"]).unwrap();
        assert_eq!(store.get("a", b"k2").unwrap(), Some(b"v2".to_vec()));
    }

    #[test]
    fn test_damaged_record_before_tail_is_corruption() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kv.db");

        let store = FileStore::open(&path, &["a"]).unwrap();
        store.put("a", b"k1", b"v1").unwrap();
        let first_end = file_len(&path) as usize;
        store.put("a", b"k2", b"v2").unwrap();
        store.close();
        drop(store);

        let mut bytes = fs::read(&path).unwrap();
        bytes[first_end - 1] ^= 0xFF;
        fs::write(&path, bytes).unwrap();

        assert!(matches!(
            FileStore::open(&path, &["a"]),
            Err(StoreError::Corrupted { .. })
        ));
    }

    #[test]
    fn test_log_is_compacted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kv.db");
        let config = FileStoreConfig {
            compact_min_bytes: 4096,
        };
        let store = FileStore::open_with_config(&path, &["a"], config).unwrap();
        let value = vec![1u8; 512];

        for i in 0u32..200 {
            store.put("a", b"hot", &value).unwrap();
            store.put("a", &i.to_be_bytes(), b"x").unwrap();
            store.delete("a", &i.to_be_bytes()).unwrap();
            assert!(file_len(&path) < 16 * 1024);
        }
        store.close();

        let store = FileStore::open(&path, &["a"]).unwrap();
        assert_eq!(store.get("a", b"hot").unwrap(), Some(value));
        assert_eq!(store.prefix_scan("a", b"", usize::MAX).unwrap().len(), 1);
    }

    #[test]
    fn test_explicit_compact_keeps_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kv.db");
        let store = FileStore::open(&path, &["a"]).unwrap();
        for i in 0u8..50 {
            store.put("a", &[i], &[i; 64]).unwrap();
        }
        for i in 0u8..40 {
            store.delete("a", &[i]).unwrap();
        }
        let before = file_len(&path);
        store.compact().unwrap();
        assert!(file_len(&path) < before);

        store.put("a", b"after", b"compact").unwrap();
        store.close();

        let store = FileStore::open(&path, &["a"]).unwrap();
        assert_eq!(store.prefix_scan("a", b"", usize::MAX).unwrap().len(), 11);
        assert_eq!(store.get("a", &[45]).unwrap(), Some(vec![45; 64]));
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kv.db");
        FileStore::open(&path, &["a"]).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
