//! # Data Directory
//!
//! The data directory holds the node keys and databases. It must be private
//! to the node's user (mode 0700) and used by one node at a time, enforced
//! with an `fs2` exclusive lock on `LOCK`.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;

const DIR_MODE: u32 = 0o700;

#[derive(Debug, Error)]
pub enum DataDirError {
    #[error("Failed to create data dir {path:?}: {error}")]
    Create { path: PathBuf, error: io::Error },

    #[error("Failed to stat data dir {path:?}: {error}")]
    Stat { path: PathBuf, error: io::Error },

    #[error("Data dir {0:?} is not a directory")]
    NotADirectory(PathBuf),

    #[error("Data dir {path:?} has invalid permissions {mode:o}")]
    InvalidPermissions { path: PathBuf, mode: u32 },

    #[error("Failed to create lock file: {0}")]
    LockFile(io::Error),

    #[error("Data dir already in use ({path:?}, pid {pid:?})")]
    AlreadyLocked { pid: Option<u32>, path: PathBuf },
}

/// Create the data directory if missing, otherwise check it.
pub fn ensure_data_dir(path: &Path) -> Result<(), DataDirError> {
    match fs::metadata(path) {
        Ok(meta) => {
            if !meta.is_dir() {
                return Err(DataDirError::NotADirectory(path.to_path_buf()));
            }
            check_mode(path, &meta)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            create_private_dir(path).map_err(|error| DataDirError::Create {
                path: path.to_path_buf(),
                error,
            })?;
            tracing::info!("[node] Created data dir {}", path.display());
            Ok(())
        }
        Err(error) => Err(DataDirError::Stat {
            path: path.to_path_buf(),
            error,
        }),
    }
}

#[cfg(unix)]
fn check_mode(path: &Path, meta: &fs::Metadata) -> Result<(), DataDirError> {
    use std::os::unix::fs::PermissionsExt;
    let mode = meta.permissions().mode() & 0o777;
    if mode != DIR_MODE {
        return Err(DataDirError::InvalidPermissions {
            path: path.to_path_buf(),
            mode,
        });
    }
    Ok(())
}

#[cfg(not(unix))]
fn check_mode(_path: &Path, _meta: &fs::Metadata) -> Result<(), DataDirError> {
    Ok(())
}

#[cfg(unix)]
fn create_private_dir(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(true).mode(DIR_MODE).create(path)
}

#[cfg(not(unix))]
fn create_private_dir(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)
}

/// Exclusive lock on a data directory, released on drop.
#[derive(Debug)]
pub struct DataDirLock {
    file: File,
    path: PathBuf,
}

impl DataDirLock {
    const LOCK_FILE: &'static str = "LOCK";

    /// Take the lock without waiting.
    pub fn acquire(data_dir: &Path) -> Result<Self, DataDirError> {
        let path = data_dir.join(Self::LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(DataDirError::LockFile)?;

        if file.try_lock_exclusive().is_err() {
            let pid = fs::read_to_string(&path)
                .ok()
                .and_then(|s| s.trim().parse().ok());
            return Err(DataDirError::AlreadyLocked { pid, path });
        }

        let mut file = file;
        file.set_len(0).map_err(DataDirError::LockFile)?;
        writeln!(file, "{}", std::process::id()).map_err(DataDirError::LockFile)?;
        file.sync_all().map_err(DataDirError::LockFile)?;

        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DataDirLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
        let _ = FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_creates_missing_dir() {
        let root = tempdir().unwrap();
        let dir = root.path().join("a").join("node");
        ensure_data_dir(&dir).unwrap();
        assert!(dir.is_dir());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&dir).unwrap().permissions().mode() & 0o777;
            assert_eq!(mode, 0o700);
        }

        // Second call accepts what the first created.
        ensure_data_dir(&dir).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_rejects_open_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let root = tempdir().unwrap();
        let dir = root.path().join("node");
        fs::create_dir(&dir).unwrap();
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(matches!(
            ensure_data_dir(&dir),
            Err(DataDirError::InvalidPermissions { mode: 0o755, .. })
        ));
    }

    #[test]
    fn test_rejects_file() {
        let root = tempdir().unwrap();
        let file = root.path().join("not-a-dir");
        fs::write(&file, b"x").unwrap();
        assert!(matches!(
            ensure_data_dir(&file),
            Err(DataDirError::NotADirectory(_))
        ));
    }

    #[test]
    fn test_lock_is_exclusive() {
        let root = tempdir().unwrap();
        let lock = DataDirLock::acquire(root.path()).unwrap();
        assert!(lock.path().exists());

        match DataDirLock::acquire(root.path()) {
            Err(DataDirError::AlreadyLocked { pid, .. }) => {
                assert_eq!(pid, Some(std::process::id()))
            }
            other => panic!("expected AlreadyLocked, got {:?}", other),
        }

        drop(lock);
        DataDirLock::acquire(root.path()).unwrap();
    }
}
