//! # Shared Types Crate
//!
//! Types shared by the provider subsystems: fixed-width identifiers, the
//! packet that travels through the dispatch pipeline, and the Sphinx geometry
//! constants every crate must agree on.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: identifier widths and payload lengths live in
//!   [`constants`] only.
//! - **Owned packets**: a [`Packet`] has exactly one owner at a time and wipes
//!   its buffers when dropped.

pub mod constants;
pub mod entities;
pub mod errors;
pub mod packet;
pub mod printable;

pub use constants::*;
pub use entities::*;
pub use errors::*;
pub use packet::{Packet, RoutingCommand};
pub use printable::{key_to_print_string, to_print_string};
