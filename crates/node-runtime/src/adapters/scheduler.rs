//! Scheduler adapter.
//!
//! The mix scheduler and connection manager are separate subsystems. The
//! provider only needs somewhere to put SURB-ACKs, so this adapter feeds them
//! into a channel that the outbound side of the node drains.

use mx_03_provider::PacketScheduler;
use shared_types::Packet;
use tokio::sync::mpsc;

pub struct ChannelScheduler {
    tx: mpsc::UnboundedSender<Packet>,
}

impl ChannelScheduler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Packet>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl PacketScheduler for ChannelScheduler {
    fn on_packet(&self, pkt: Packet) {
        if let Err(e) = self.tx.send(pkt) {
            tracing::debug!("[node] Outbound path closed, dropping packet {}", e.0.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{NodeId, RoutingCommand};

    fn forward_packet() -> Packet {
        Packet::new(
            vec![1, 2, 3],
            vec![],
            vec![RoutingCommand::NextNodeHop(NodeId([3; 32]))],
        )
        .unwrap()
    }

    #[test]
    fn test_packets_reach_receiver() {
        let (scheduler, mut rx) = ChannelScheduler::new();
        let pkt = forward_packet();
        let id = pkt.id;
        scheduler.on_packet(pkt);

        assert_eq!(rx.try_recv().unwrap().id, id);
    }

    #[test]
    fn test_closed_receiver_is_not_fatal() {
        let (scheduler, rx) = ChannelScheduler::new();
        drop(rx);
        scheduler.on_packet(forward_packet());
    }
}
