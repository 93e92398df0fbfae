//! # Node Keys
//!
//! The identity (Ed25519) and link (X25519) private keys, stored as single
//! PEM blocks in the data directory:
//!
//! | File | PEM tag |
//! |------|---------|
//! | `identity.private.pem` | `Ed25519 PRIVATE KEY` |
//! | `link.private.pem` | `X25519 PRIVATE KEY` |
//!
//! Missing keys are generated and written with mode 0600. Buffers holding
//! decoded key bytes are wiped as soon as the key has been built. This is
//! best effort: copies the allocator or the OS made along the way are not
//! reachable from here.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use ed25519_dalek::SigningKey;
use pem::Pem;
use rand::rngs::OsRng;
use shared_types::key_to_print_string;
use thiserror::Error;
use x25519_dalek::{PublicKey as LinkPublicKey, StaticSecret};
use zeroize::{Zeroize, Zeroizing};

pub const IDENTITY_KEY_FILE: &str = "identity.private.pem";
pub const IDENTITY_KEY_TAG: &str = "Ed25519 PRIVATE KEY";
pub const LINK_KEY_FILE: &str = "link.private.pem";
pub const LINK_KEY_TAG: &str = "X25519 PRIVATE KEY";

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("Failed to access {path:?}: {error}")]
    Io { path: PathBuf, error: io::Error },

    #[error("Malformed PEM in {path:?}: {message}")]
    Pem { path: PathBuf, message: String },

    #[error("Invalid PEM Type in {path:?}: '{found}' (expected '{expected}')")]
    WrongTag {
        path: PathBuf,
        expected: &'static str,
        found: String,
    },

    #[error("Trailing garbage after private key in {0:?}")]
    TrailingData(PathBuf),

    #[error("Invalid key material in {path:?}: {message}")]
    InvalidKey { path: PathBuf, message: String },
}

/// The node's long-term keys.
pub struct NodeKeys {
    pub identity: SigningKey,
    pub link: StaticSecret,
}

impl NodeKeys {
    /// Load both keys from `data_dir`, generating whichever is missing.
    pub fn load_or_generate(data_dir: &Path) -> Result<Self, KeyError> {
        let identity = load_or_generate_identity(&data_dir.join(IDENTITY_KEY_FILE))?;
        let link = load_or_generate_link(&data_dir.join(LINK_KEY_FILE))?;

        let keys = Self { identity, link };
        tracing::info!(
            "[node] Identity key: {}",
            key_to_print_string(&keys.identity_public())
        );
        tracing::info!(
            "[node] Link key: {}",
            key_to_print_string(keys.link_public().as_bytes())
        );
        Ok(keys)
    }

    pub fn identity_public(&self) -> [u8; 32] {
        self.identity.verifying_key().to_bytes()
    }

    pub fn link_public(&self) -> LinkPublicKey {
        LinkPublicKey::from(&self.link)
    }
}

fn load_or_generate_identity(path: &Path) -> Result<SigningKey, KeyError> {
    if let Some(bytes) = read_key_block(path, IDENTITY_KEY_TAG)? {
        return identity_from_bytes(path, &bytes);
    }

    let key = SigningKey::generate(&mut OsRng);
    let bytes = Zeroizing::new(key.to_keypair_bytes());
    write_key_block(path, IDENTITY_KEY_TAG, bytes.as_slice())?;
    tracing::info!("[node] Generated identity key {:?}", path);
    Ok(key)
}

/// Accepts the 32 byte seed or the 64 byte seed-and-public-key encoding.
fn identity_from_bytes(path: &Path, bytes: &[u8]) -> Result<SigningKey, KeyError> {
    let invalid = |message: String| KeyError::InvalidKey {
        path: path.to_path_buf(),
        message,
    };
    match bytes.len() {
        32 => {
            let mut seed = Zeroizing::new([0u8; 32]);
            seed.copy_from_slice(bytes);
            Ok(SigningKey::from_bytes(&seed))
        }
        64 => {
            let mut pair = Zeroizing::new([0u8; 64]);
            pair.copy_from_slice(bytes);
            SigningKey::from_keypair_bytes(&pair).map_err(|e| invalid(e.to_string()))
        }
        n => Err(invalid(format!("expected 32 or 64 bytes, got {}", n))),
    }
}

fn load_or_generate_link(path: &Path) -> Result<StaticSecret, KeyError> {
    if let Some(bytes) = read_key_block(path, LINK_KEY_TAG)? {
        if bytes.len() != 32 {
            return Err(KeyError::InvalidKey {
                path: path.to_path_buf(),
                message: format!("expected 32 bytes, got {}", bytes.len()),
            });
        }
        let mut raw = Zeroizing::new([0u8; 32]);
        raw.copy_from_slice(&bytes);
        return Ok(StaticSecret::from(*raw));
    }

    let key = StaticSecret::random_from_rng(OsRng);
    let bytes = Zeroizing::new(key.to_bytes());
    write_key_block(path, LINK_KEY_TAG, bytes.as_slice())?;
    tracing::info!("[node] Generated link key {:?}", path);
    Ok(key)
}

/// Read and decode one PEM block. `None` if the file does not exist.
fn read_key_block(path: &Path, tag: &'static str) -> Result<Option<Zeroizing<Vec<u8>>>, KeyError> {
    let buf = match fs::read(path) {
        Ok(buf) => Zeroizing::new(buf),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(error) => {
            return Err(KeyError::Io {
                path: path.to_path_buf(),
                error,
            })
        }
    };
    let pem_error = |message: String| KeyError::Pem {
        path: path.to_path_buf(),
        message,
    };

    let text = std::str::from_utf8(&buf).map_err(|e| pem_error(e.to_string()))?;
    if has_trailing_data(text) {
        return Err(KeyError::TrailingData(path.to_path_buf()));
    }

    let block = pem::parse(text).map_err(|e| pem_error(e.to_string()))?;
    if block.tag() != tag {
        return Err(KeyError::WrongTag {
            path: path.to_path_buf(),
            expected: tag,
            found: block.tag().to_string(),
        });
    }
    Ok(Some(Zeroizing::new(block.into_contents())))
}

/// True if anything but whitespace follows the first `-----END ...-----` line.
fn has_trailing_data(text: &str) -> bool {
    let Some(end) = text.find("-----END ") else {
        return false;
    };
    let after_marker = &text[end + "-----END ".len()..];
    match after_marker.find("-----") {
        Some(close) => !after_marker[close + "-----".len()..].trim().is_empty(),
        None => false,
    }
}

fn write_key_block(path: &Path, tag: &str, bytes: &[u8]) -> Result<(), KeyError> {
    let block = Pem::new(tag, bytes.to_vec());
    let encoded = Zeroizing::new(pem::encode(&block));
    block.into_contents().zeroize();

    let io_error = |error| KeyError::Io {
        path: path.to_path_buf(),
        error,
    };
    let mut file = create_private_file(path).map_err(io_error)?;
    file.write_all(encoded.as_bytes()).map_err(io_error)?;
    file.sync_all().map_err(io_error)
}

#[cfg(unix)]
fn create_private_file(path: &Path) -> io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn create_private_file(path: &Path) -> io::Result<fs::File> {
    fs::OpenOptions::new().write(true).create_new(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_generate_then_reload() {
        let dir = tempdir().unwrap();
        let first = NodeKeys::load_or_generate(dir.path()).unwrap();
        assert!(dir.path().join(IDENTITY_KEY_FILE).exists());
        assert!(dir.path().join(LINK_KEY_FILE).exists());

        let second = NodeKeys::load_or_generate(dir.path()).unwrap();
        assert_eq!(first.identity_public(), second.identity_public());
        assert_eq!(first.link_public().as_bytes(), second.link_public().as_bytes());
    }

    #[cfg(unix)]
    #[test]
    fn test_generated_keys_are_private() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempdir().unwrap();
        NodeKeys::load_or_generate(dir.path()).unwrap();
        for file in [IDENTITY_KEY_FILE, LINK_KEY_FILE] {
            let mode = fs::metadata(dir.path().join(file)).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn test_identity_file_format() {
        let dir = tempdir().unwrap();
        let keys = NodeKeys::load_or_generate(dir.path()).unwrap();
        let text = fs::read_to_string(dir.path().join(IDENTITY_KEY_FILE)).unwrap();
        let block = pem::parse(text).unwrap();

        assert_eq!(block.tag(), IDENTITY_KEY_TAG);
        assert_eq!(block.contents(), keys.identity.to_keypair_bytes().as_slice());
    }

    #[test]
    fn test_seed_only_identity_accepted() {
        let dir = tempdir().unwrap();
        let pem = pem::encode(&Pem::new(IDENTITY_KEY_TAG, vec![9u8; 32]));
        fs::write(dir.path().join(IDENTITY_KEY_FILE), pem).unwrap();

        let keys = NodeKeys::load_or_generate(dir.path()).unwrap();
        assert_eq!(keys.identity.to_bytes(), [9u8; 32]);
    }

    #[test]
    fn test_wrong_tag_rejected() {
        let dir = tempdir().unwrap();
        let pem = pem::encode(&Pem::new("RSA PRIVATE KEY", vec![1u8; 32]));
        fs::write(dir.path().join(LINK_KEY_FILE), pem).unwrap();

        let err = load_or_generate_link(&dir.path().join(LINK_KEY_FILE)).err().unwrap();
        assert!(matches!(err, KeyError::WrongTag { found, .. } if found == "RSA PRIVATE KEY"));
    }

    #[test]
    fn test_trailing_garbage_rejected() {
        let dir = tempdir().unwrap();
        let mut pem = pem::encode(&Pem::new(LINK_KEY_TAG, vec![1u8; 32]));
        pem.push_str("garbage\n");
        fs::write(dir.path().join(LINK_KEY_FILE), pem).unwrap();

        let err = load_or_generate_link(&dir.path().join(LINK_KEY_FILE)).err().unwrap();
        assert!(matches!(err, KeyError::TrailingData(_)));
    }

    #[test]
    fn test_wrong_length_rejected() {
        let dir = tempdir().unwrap();
        let pem = pem::encode(&Pem::new(LINK_KEY_TAG, vec![1u8; 31]));
        fs::write(dir.path().join(LINK_KEY_FILE), pem).unwrap();

        let err = load_or_generate_link(&dir.path().join(LINK_KEY_FILE)).err().unwrap();
        assert!(matches!(err, KeyError::InvalidKey { .. }));
    }

    #[test]
    fn test_trailing_data_detection() {
        let clean = "-----BEGIN X-----\nAAAA\n-----END X-----\n";
        assert!(!has_trailing_data(clean));
        assert!(has_trailing_data(&format!("{}more", clean)));
        assert!(!has_trailing_data("no pem here"));
    }
}
