//! # Packet
//!
//! A Sphinx packet after the crypto workers have unwrapped this hop's layer.
//! The routing commands decide what the node does with it next:
//!
//! | Commands | Kind |
//! |----------|------|
//! | `NextNodeHop` (+ `NodeDelay`) | forward to another mix |
//! | `Recipient` | user message for a local client |
//! | `Recipient` + `SurbReply` | SURB reply for a local client |
//!
//! Dropping a packet wipes `raw` and `payload`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use zeroize::Zeroize;

use crate::constants::MAX_NODE_DELAY_MS;
use crate::entities::{NodeId, RecipientId, SurbId};
use crate::errors::PacketError;

static NEXT_PACKET_ID: AtomicU64 = AtomicU64::new(1);

/// A routing command recovered from the Sphinx header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingCommand {
    /// Forward to this node.
    NextNodeHop(NodeId),
    /// Mixing delay requested by the sender, in milliseconds.
    NodeDelay(u32),
    /// Deliver to this local user.
    Recipient(RecipientId),
    /// The payload is a reply to the SURB with this identifier.
    SurbReply(SurbId),
}

impl RoutingCommand {
    fn name(&self) -> &'static str {
        match self {
            RoutingCommand::NextNodeHop(_) => "next_node_hop",
            RoutingCommand::NodeDelay(_) => "node_delay",
            RoutingCommand::Recipient(_) => "recipient",
            RoutingCommand::SurbReply(_) => "surb_reply",
        }
    }
}

/// A packet owned by exactly one stage of the node at a time.
pub struct Packet {
    /// Process-unique identifier, used only for logging.
    pub id: u64,
    /// The raw (re-wrapped) Sphinx packet, for forwarding.
    pub raw: Vec<u8>,
    /// The decrypted payload, for local delivery.
    pub payload: Vec<u8>,
    /// When the packet was received from the network.
    pub recv_at: Instant,
    /// Scheduling delay assigned to this packet.
    pub delay: Duration,
    /// Forward even if the scheduler is shedding load.
    pub must_forward: bool,
    cmds: Vec<RoutingCommand>,
}

impl Packet {
    /// Build a packet from its unwrapped parts.
    ///
    /// The command set must describe exactly one destination (see the module
    /// table) and may not repeat a command.
    pub fn new(
        raw: Vec<u8>,
        payload: Vec<u8>,
        cmds: Vec<RoutingCommand>,
    ) -> Result<Self, PacketError> {
        validate_commands(&cmds)?;
        Ok(Self {
            id: NEXT_PACKET_ID.fetch_add(1, Ordering::Relaxed),
            raw,
            payload,
            recv_at: Instant::now(),
            delay: Duration::ZERO,
            must_forward: false,
            cmds,
        })
    }

    pub fn commands(&self) -> &[RoutingCommand] {
        &self.cmds
    }

    pub fn recipient(&self) -> Option<&RecipientId> {
        self.cmds.iter().find_map(|c| match c {
            RoutingCommand::Recipient(r) => Some(r),
            _ => None,
        })
    }

    pub fn surb_reply(&self) -> Option<&SurbId> {
        self.cmds.iter().find_map(|c| match c {
            RoutingCommand::SurbReply(s) => Some(s),
            _ => None,
        })
    }

    pub fn next_node_hop(&self) -> Option<&NodeId> {
        self.cmds.iter().find_map(|c| match c {
            RoutingCommand::NextNodeHop(n) => Some(n),
            _ => None,
        })
    }

    /// The sender-requested mixing delay in milliseconds.
    pub fn node_delay(&self) -> Option<u32> {
        self.cmds.iter().find_map(|c| match c {
            RoutingCommand::NodeDelay(d) => Some(*d),
            _ => None,
        })
    }
}

impl std::fmt::Debug for Packet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Packet")
            .field("id", &self.id)
            .field("raw_len", &self.raw.len())
            .field("payload_len", &self.payload.len())
            .field("cmds", &self.cmds)
            .field("delay", &self.delay)
            .field("must_forward", &self.must_forward)
            .finish()
    }
}

impl Drop for Packet {
    fn drop(&mut self) {
        self.raw.zeroize();
        self.payload.zeroize();
    }
}

fn validate_commands(cmds: &[RoutingCommand]) -> Result<(), PacketError> {
    for (i, cmd) in cmds.iter().enumerate() {
        let seen = cmds[..i]
            .iter()
            .any(|prev| std::mem::discriminant(prev) == std::mem::discriminant(cmd));
        if seen {
            return Err(PacketError::DuplicateCommand(cmd.name()));
        }
        if let RoutingCommand::NodeDelay(d) = cmd {
            if *d > MAX_NODE_DELAY_MS {
                return Err(PacketError::DelayTooLarge(*d));
            }
        }
    }

    let has = |name: &str| cmds.iter().any(|c| c.name() == name);
    match (has("next_node_hop"), has("recipient")) {
        (true, true) => return Err(PacketError::ConflictingDestination),
        (false, false) => return Err(PacketError::MissingDestination),
        _ => {}
    }
    if has("surb_reply") && !has("recipient") {
        return Err(PacketError::OrphanSurbReply);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipient(name: &[u8]) -> RoutingCommand {
        RoutingCommand::Recipient(RecipientId::from_username(name).unwrap())
    }

    #[test]
    fn test_classify_user_message() {
        let pkt = Packet::new(vec![], vec![1, 2], vec![recipient(b"bob")]).unwrap();
        assert_eq!(pkt.recipient().unwrap().trimmed(), b"bob");
        assert_eq!(pkt.surb_reply(), None);
        assert_eq!(pkt.next_node_hop(), None);
    }

    #[test]
    fn test_classify_surb_reply() {
        let cmds = vec![recipient(b"bob"), RoutingCommand::SurbReply(SurbId([7; 16]))];
        let pkt = Packet::new(vec![], vec![], cmds).unwrap();
        assert!(pkt.recipient().is_some());
        assert_eq!(pkt.surb_reply(), Some(&SurbId([7; 16])));
    }

    #[test]
    fn test_classify_forward() {
        let cmds = vec![
            RoutingCommand::NextNodeHop(NodeId([1; 32])),
            RoutingCommand::NodeDelay(250),
        ];
        let pkt = Packet::new(vec![0; 8], vec![], cmds).unwrap();
        assert_eq!(pkt.next_node_hop(), Some(&NodeId([1; 32])));
        assert_eq!(pkt.recipient(), None);
        assert_eq!(pkt.node_delay(), Some(250));
    }

    #[test]
    fn test_reject_conflicting_destination() {
        let cmds = vec![RoutingCommand::NextNodeHop(NodeId([1; 32])), recipient(b"bob")];
        assert_eq!(
            Packet::new(vec![], vec![], cmds).unwrap_err(),
            PacketError::ConflictingDestination
        );
    }

    #[test]
    fn test_reject_duplicate_command() {
        let cmds = vec![recipient(b"a"), recipient(b"b")];
        assert_eq!(
            Packet::new(vec![], vec![], cmds).unwrap_err(),
            PacketError::DuplicateCommand("recipient")
        );
    }

    #[test]
    fn test_reject_orphan_surb_reply() {
        let cmds = vec![
            RoutingCommand::NextNodeHop(NodeId([1; 32])),
            RoutingCommand::SurbReply(SurbId::default()),
        ];
        assert_eq!(
            Packet::new(vec![], vec![], cmds).unwrap_err(),
            PacketError::OrphanSurbReply
        );
    }

    #[test]
    fn test_reject_excessive_delay() {
        let cmds = vec![recipient(b"a"), RoutingCommand::NodeDelay(MAX_NODE_DELAY_MS + 1)];
        assert!(matches!(
            Packet::new(vec![], vec![], cmds),
            Err(PacketError::DelayTooLarge(_))
        ));
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Packet::new(vec![], vec![], vec![recipient(b"a")]).unwrap();
        let b = Packet::new(vec![], vec![], vec![recipient(b"a")]).unwrap();
        assert_ne!(a.id, b.id);
    }
}
