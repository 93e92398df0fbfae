//! Spool entries.

use serde::{Deserialize, Serialize};
use shared_types::SurbId;

/// One queued item in a user's spool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpoolEntry {
    /// Ciphertext of a user message.
    Message(Vec<u8>),
    /// Payload of a reply to one of the user's SURBs.
    SurbReply { id: SurbId, payload: Vec<u8> },
}

/// The head of a spool as handed to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpoolMessage {
    pub payload: Vec<u8>,
    /// Set for SURB replies, `None` for plain messages.
    pub surb_id: Option<SurbId>,
}

impl From<SpoolEntry> for SpoolMessage {
    fn from(entry: SpoolEntry) -> Self {
        match entry {
            SpoolEntry::Message(payload) => SpoolMessage {
                payload,
                surb_id: None,
            },
            SpoolEntry::SurbReply { id, payload } => SpoolMessage {
                payload,
                surb_id: Some(id),
            },
        }
    }
}
