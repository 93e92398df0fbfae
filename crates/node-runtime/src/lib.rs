//! # Node Runtime Library
//!
//! Everything the `node-runtime` binary does, exposed for integration tests.
//!
//! - `container/` - Configuration and the `ProviderContainer` composition root
//! - `adapters/` - Data directory, node keys, and the stand-ins for the parts
//!   of the mix node that live outside the provider
//! - `logging` - `tracing` subscriber setup

pub mod adapters;
pub mod container;
pub mod logging;

pub use container::{ContainerError, NodeConfig, ProviderContainer};
