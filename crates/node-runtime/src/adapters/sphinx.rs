//! `SurbAckFactory` for a node started without a Sphinx engine.
//!
//! Every SURB-ACK request fails with `EngineUnavailable`; messages are still
//! spooled, they are just not acknowledged.

use mx_03_provider::{AckError, SurbAckFactory};
use shared_types::NodeId;

#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableSphinx;

impl SurbAckFactory for UnavailableSphinx {
    fn new_packet_from_surb(&self, _surb: &[u8], _payload: &[u8]) -> Result<(Vec<u8>, NodeId), AckError> {
        Err(AckError::EngineUnavailable)
    }
}
