//! # User Directory (mx-01)
//!
//! The provider's credential store: every local user is a username bound to
//! the X25519 link key their client authenticates with.
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Description |
//! |----|-----------|-------------|
//! | 1 | Fail Closed | A store whose schema version is not ours refuses to open |
//! | 2 | One Key Per User | `add` overwrites, last write wins |
//! | 3 | Constant-Time Validation | Key comparison never exits early on a mismatch |
//! | 4 | Quiet Rejection | Bad arguments yield `false`, never an error, from `is_valid` |
//! | 5 | Namespaces Present | A missing namespace after open is corruption and aborts |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Username rules, key comparison, schema markers, errors
//! - `ports/` - The `UserDirectoryApi` trait consumed by the provider
//! - `service/` - `UserDirectory`, generic over a `KeyValueStore`
//!
//! ## Usage
//!
//! ```ignore
//! use mx_01_user_db::{UserDbConfig, UserDirectory, UserDirectoryApi};
//!
//! let dir = UserDirectory::open_file("/var/lib/mix/users.db", UserDbConfig::default())?;
//! dir.add(b"alice", &alice_key)?;
//! assert!(dir.is_valid(b"alice", alice_key.as_bytes()));
//! ```

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::credentials::UserDbConfig;
pub use domain::errors::UserDbError;
pub use domain::schema::{METADATA_NAMESPACE, NAMESPACES, SCHEMA_VERSION, USERS_NAMESPACE};
pub use ports::inbound::UserDirectoryApi;
pub use service::UserDirectory;
