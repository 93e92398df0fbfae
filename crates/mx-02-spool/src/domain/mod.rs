//! # Domain Layer
//!
//! - `entities` - Spool entries and what `get` returns
//! - `keys` - Durable key layout
//! - `errors` - Error types

pub mod entities;
pub mod errors;
pub mod keys;
