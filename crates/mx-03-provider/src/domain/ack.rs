//! SURB-ACK construction.

use shared_types::{NodeId, Packet, RoutingCommand, FORWARD_PAYLOAD_LENGTH};

use crate::domain::errors::AckError;

/// The body of every SURB-ACK: an all-zero forward payload.
pub fn ack_payload() -> Vec<u8> {
    vec![0u8; FORWARD_PAYLOAD_LENGTH]
}

/// Wrap the raw packet derived from a SURB into a forward packet.
///
/// The ack keeps the original packet's `delay` and `recv_at` so the scheduler
/// treats it exactly as it would have treated the original, and it is marked
/// `must_forward`. A missing node delay on the original becomes `0`.
pub fn build_ack_packet(original: &Packet, raw: Vec<u8>, first_hop: NodeId) -> Result<Packet, AckError> {
    let cmds = vec![
        RoutingCommand::NextNodeHop(first_hop),
        RoutingCommand::NodeDelay(original.node_delay().unwrap_or(0)),
    ];
    let mut ack = Packet::new(raw, Vec::new(), cmds)?;
    ack.recv_at = original.recv_at;
    ack.delay = original.delay;
    ack.must_forward = true;
    Ok(ack)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::RecipientId;
    use std::time::Duration;

    fn original(delay_cmd: Option<u32>) -> Packet {
        let mut cmds = vec![RoutingCommand::Recipient(
            RecipientId::from_username(b"alice").unwrap(),
        )];
        if let Some(d) = delay_cmd {
            cmds.push(RoutingCommand::NodeDelay(d));
        }
        let mut pkt = Packet::new(vec![], vec![1, 2, 3], cmds).unwrap();
        pkt.delay = Duration::from_millis(750);
        pkt
    }

    #[test]
    fn test_ack_inherits_timing() {
        let orig = original(Some(420));
        let ack = build_ack_packet(&orig, vec![0xAB; 8], NodeId([4; 32])).unwrap();

        assert_eq!(ack.delay, orig.delay);
        assert_eq!(ack.recv_at, orig.recv_at);
        assert!(ack.must_forward);
        assert_eq!(ack.next_node_hop(), Some(&NodeId([4; 32])));
        assert_eq!(ack.node_delay(), Some(420));
        assert_eq!(ack.commands().len(), 2);
        assert_eq!(ack.raw, vec![0xAB; 8]);
        assert_ne!(ack.id, orig.id);
    }

    #[test]
    fn test_missing_node_delay_becomes_zero() {
        let ack = build_ack_packet(&original(None), vec![], NodeId([1; 32])).unwrap();
        assert_eq!(ack.node_delay(), Some(0));
    }

    #[test]
    fn test_ack_payload_size() {
        assert_eq!(ack_payload().len(), FORWARD_PAYLOAD_LENGTH);
        assert!(ack_payload().iter().all(|b| *b == 0));
    }
}
