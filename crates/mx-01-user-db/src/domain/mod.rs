//! # Domain Layer
//!
//! - `credentials` - Username bounds and constant-time key comparison
//! - `schema` - Namespace names and the schema version marker
//! - `errors` - Error types

pub mod credentials;
pub mod errors;
pub mod schema;
