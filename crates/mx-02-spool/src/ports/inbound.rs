//! # Spool Port
//!
//! The capability the provider pipeline stores into and the client-facing
//! retrieval path reads from. Any durable or in-memory backend may implement
//! it; the pipeline only sees `Arc<dyn Spool>`.

use shared_types::SurbId;

use crate::domain::entities::SpoolMessage;
use crate::domain::errors::SpoolError;

pub trait Spool: Send + Sync {
    /// Append a message ciphertext to `user`'s spool.
    fn store_message(&self, user: &[u8], msg: &[u8]) -> Result<(), SpoolError>;

    /// Append a SURB reply to `user`'s spool.
    fn store_surb_reply(&self, user: &[u8], id: &SurbId, msg: &[u8]) -> Result<(), SpoolError>;

    /// Optionally delete the first entry in `user`'s spool, then return the
    /// (new) first entry. `None` when the spool is empty.
    fn get(&self, user: &[u8], advance: bool) -> Result<Option<SpoolMessage>, SpoolError>;

    /// Flush and release the spool.
    fn close(&self);
}
