//! Provider node integration tests.
//!
//! Bring up a complete `ProviderContainer` on a temporary data directory and
//! drive it the way the network layer would.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use mx_01_user_db::UserDirectoryApi;
use mx_03_provider::{AckError, BlockFlags, PlaintextBlock, ProviderApi, ProviderError, SurbAckFactory};
use node_runtime::adapters::{ChannelScheduler, DataDirError};
use node_runtime::container::{ContainerError, NodeConfig, ProviderContainer, StorageBackend};
use shared_types::{NodeId, Packet, PeerCredentials, PublicKey, RecipientId, RoutingCommand, SURB_LENGTH};
use tempfile::TempDir;

const HOP: NodeId = NodeId([0xEE; 32]);

/// Stand-in Sphinx engine: the "packet" it derives is the SURB's first bytes.
struct EchoSurbEngine;

impl SurbAckFactory for EchoSurbEngine {
    fn new_packet_from_surb(&self, surb: &[u8], _payload: &[u8]) -> Result<(Vec<u8>, NodeId), AckError> {
        Ok((surb[..8].to_vec(), HOP))
    }
}

fn config_for(dir: &Path, backend: StorageBackend) -> NodeConfig {
    let mut config = NodeConfig::default();
    config.server.identifier = "test-provider".to_string();
    config.server.data_dir = dir.join("node");
    config.provider.backend = backend;
    config
}

fn start(
    config: NodeConfig,
) -> Result<(ProviderContainer, tokio::sync::mpsc::UnboundedReceiver<Packet>), ContainerError> {
    let (scheduler, rx) = ChannelScheduler::new();
    let container = ProviderContainer::new(config, Arc::new(EchoSurbEngine), Arc::new(scheduler))?;
    Ok((container, rx))
}

fn alice_packet(ciphertext: &[u8], delay: Duration) -> Packet {
    let payload = PlaintextBlock::encode(BlockFlags::HasSurb, Some(&[0x11; SURB_LENGTH]), ciphertext);
    let cmds = vec![
        RoutingCommand::Recipient(RecipientId::from_username(b"alice").unwrap()),
        RoutingCommand::NodeDelay(delay.as_millis() as u32),
    ];
    let mut pkt = Packet::new(Vec::new(), payload, cmds).unwrap();
    pkt.delay = delay;
    pkt
}

#[test]
fn test_alice_message_spooled_and_acked() {
    let tmp = TempDir::new().unwrap();
    let (node, mut acks) = start(config_for(tmp.path(), StorageBackend::File)).unwrap();

    let alice_key = PublicKey([0xA1; 32]);
    node.directory().add(b"alice", &alice_key).unwrap();
    assert!(node
        .provider()
        .authenticate_client(&PeerCredentials::new(b"alice".to_vec(), alice_key.0.to_vec())));

    node.provider()
        .on_packet(alice_packet(b"C", Duration::from_millis(900)))
        .unwrap();
    let spool = node.spool();
    node.shutdown();

    let ack = acks.try_recv().expect("one SURB-ACK");
    assert_eq!(ack.delay, Duration::from_millis(900));
    assert_eq!(ack.next_node_hop(), Some(&HOP));
    assert!(ack.must_forward);
    assert!(acks.try_recv().is_err());

    drop(spool);
    drop(node);

    // Everything was persisted: reopen and read alice's spool.
    let (node, _acks) = start(config_for(tmp.path(), StorageBackend::File)).unwrap();
    let head = node.spool().get(b"alice", false).unwrap().unwrap();
    assert_eq!(head.payload, b"C");
    assert_eq!(head.surb_id, None);
    assert!(node.directory().is_valid(b"alice", &[0xA1; 32]));
}

#[test]
fn test_keys_stable_across_restarts() {
    let tmp = TempDir::new().unwrap();
    let config = config_for(tmp.path(), StorageBackend::Memory);

    let (node, _rx) = start(config.clone()).unwrap();
    let identity = node.keys().identity_public();
    let link = *node.keys().link_public().as_bytes();
    drop(node);

    let (node, _rx) = start(config).unwrap();
    assert_eq!(node.keys().identity_public(), identity);
    assert_eq!(*node.keys().link_public().as_bytes(), link);
}

#[test]
fn test_second_node_on_same_data_dir_refused() {
    let tmp = TempDir::new().unwrap();
    let config = config_for(tmp.path(), StorageBackend::Memory);

    let (_node, _rx) = start(config.clone()).unwrap();
    match start(config) {
        Err(ContainerError::DataDir(DataDirError::AlreadyLocked { .. })) => {}
        Err(other) => panic!("expected lock error, got {}", other),
        Ok(_) => panic!("second node started on a locked data dir"),
    }
}

#[test]
fn test_packets_refused_after_shutdown() {
    let tmp = TempDir::new().unwrap();
    let (node, _rx) = start(config_for(tmp.path(), StorageBackend::Memory)).unwrap();
    node.directory().add(b"alice", &PublicKey([1; 32])).unwrap();

    node.shutdown();
    node.shutdown();

    let result = node
        .provider()
        .on_packet(alice_packet(b"late", Duration::ZERO));
    assert_eq!(result, Err(ProviderError::Halted));
}

#[test]
fn test_invalid_config_refused() {
    let tmp = TempDir::new().unwrap();
    let mut config = config_for(tmp.path(), StorageBackend::Memory);
    config.provider.max_username_len = 0;

    assert!(matches!(start(config), Err(ContainerError::Config(_))));
}
