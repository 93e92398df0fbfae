//! # Provider Container
//!
//! The composition root. Builds the provider's components in dependency
//! order and hands each one only the handles it needs:
//!
//! ```text
//! data dir + lock -> node keys -> user directory -> spool -> pipeline
//!                                       |             |        |
//!                                       +------ Arc --+        +-- Weak<scheduler>
//! ```
//!
//! Shutdown runs in the opposite direction through `ProviderPipeline::halt`.

pub mod config;
pub mod provider;

pub use config::{ConfigError, NodeConfig, StorageBackend};
pub use provider::{open_directory, ContainerError, ProviderContainer};
