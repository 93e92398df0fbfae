//! # Adapters
//!
//! - `data_dir` - Data directory checks and the single-node lock
//! - `keys` - Identity and link key files
//! - `scheduler` - Hands SURB-ACKs to the node's outbound path
//! - `sphinx` - `SurbAckFactory` for nodes without a packet engine

pub mod data_dir;
pub mod keys;
pub mod scheduler;
pub mod sphinx;

pub use data_dir::{ensure_data_dir, DataDirError, DataDirLock};
pub use keys::{KeyError, NodeKeys};
pub use scheduler::ChannelScheduler;
pub use sphinx::UnavailableSphinx;
