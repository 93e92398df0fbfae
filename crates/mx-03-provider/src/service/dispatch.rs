//! Per-packet dispatch, run on the worker thread.

use std::sync::{Arc, Weak};

use mx_01_user_db::UserDirectoryApi;
use mx_02_spool::Spool;
use shared_types::{to_print_string, Packet};

use crate::domain::ack::{ack_payload, build_ack_packet};
use crate::domain::block::PlaintextBlock;
use crate::domain::stats::ProviderStats;
use crate::ports::outbound::{PacketScheduler, SurbAckFactory};

/// Everything the worker needs to handle one packet.
pub(crate) struct Dispatcher {
    pub(crate) directory: Arc<dyn UserDirectoryApi>,
    pub(crate) spool: Arc<dyn Spool>,
    pub(crate) ack_factory: Arc<dyn SurbAckFactory>,
    pub(crate) scheduler: Weak<dyn PacketScheduler>,
    pub(crate) stats: Arc<ProviderStats>,
}

impl Dispatcher {
    /// Handle one packet. The packet is disposed when this returns.
    pub(crate) fn dispatch(&self, pkt: Packet) {
        let Some(recipient_id) = pkt.recipient() else {
            tracing::debug!("[provider] Dropping packet: {} (Not addressed to a user)", pkt.id);
            ProviderStats::bump(&self.stats.dropped_malformed);
            return;
        };
        let recipient = recipient_id.trimmed();

        if !self.directory.exists(recipient) {
            tracing::debug!(
                "[provider] Dropping packet: {} (Invalid Recipient: '{}')",
                pkt.id,
                to_print_string(recipient)
            );
            ProviderStats::bump(&self.stats.dropped_recipient);
            return;
        }

        if let Some(id) = pkt.surb_reply() {
            self.on_surb_reply(&pkt, recipient, id);
        } else {
            self.on_to_user(&pkt, recipient);
        }
    }

    fn on_surb_reply(&self, pkt: &Packet, recipient: &[u8], id: &shared_types::SurbId) {
        match self.spool.store_surb_reply(recipient, id, &pkt.payload) {
            Ok(()) => {
                ProviderStats::bump(&self.stats.stored_surb_replies);
                tracing::debug!("[provider] Stored SURB reply: {}", pkt.id);
            }
            Err(e) => {
                ProviderStats::bump(&self.stats.store_failures);
                tracing::debug!("[provider] Failed to store SURB reply: {} ({})", pkt.id, e);
            }
        }
    }

    fn on_to_user(&self, pkt: &Packet, recipient: &[u8]) {
        let block = match PlaintextBlock::decode(&pkt.payload) {
            Ok(block) => block,
            Err(e) => {
                tracing::debug!("[provider] Dropping packet: {} ({})", pkt.id, e);
                ProviderStats::bump(&self.stats.dropped_malformed);
                return;
            }
        };

        if let Err(e) = self.spool.store_message(recipient, block.ciphertext) {
            ProviderStats::bump(&self.stats.store_failures);
            tracing::debug!("[provider] Failed to store message payload: {} ({})", pkt.id, e);
            return;
        }
        ProviderStats::bump(&self.stats.stored_messages);

        if let Some(surb) = block.surb {
            self.send_surb_ack(pkt, surb);
        }
    }

    fn send_surb_ack(&self, pkt: &Packet, surb: &[u8]) {
        let ack = self
            .ack_factory
            .new_packet_from_surb(surb, &ack_payload())
            .and_then(|(raw, first_hop)| build_ack_packet(pkt, raw, first_hop));
        let ack = match ack {
            Ok(ack) => ack,
            Err(e) => {
                ProviderStats::bump(&self.stats.ack_failures);
                tracing::debug!("[provider] Failed to generate SURB-ACK: {} ({})", pkt.id, e);
                return;
            }
        };

        match self.scheduler.upgrade() {
            Some(scheduler) => {
                tracing::debug!(
                    "[provider] Handing off user destined SURB-ACK: {} (Src:{})",
                    ack.id,
                    pkt.id
                );
                scheduler.on_packet(ack);
                ProviderStats::bump(&self.stats.acks_scheduled);
            }
            None => {
                ProviderStats::bump(&self.stats.ack_failures);
                tracing::warn!("[provider] Scheduler gone, discarding SURB-ACK: {}", ack.id);
            }
        }
    }
}
