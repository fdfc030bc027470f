use crate::liveness::PeerStatusListener;
use crate::transport::Transport;
use libp2p::identity::Keypair;
use libpeerwire::error::SignatureError;
use libpeerwire::signature::attach_signature;
use libpeerwire::{Command, Message, MessageType, NodeConfig, PeerAddress};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Everything an RPC needs to know about the node it runs on: who the node is, how it is configured, where to report
/// peer liveness and how to reach other peers. Cheap to clone.
#[derive(Clone)]
pub struct NodeContext {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    keypair: Keypair,
    address: PeerAddress,
    config: NodeConfig,
    peer_map: Arc<dyn PeerStatusListener>,
    transport: Arc<dyn Transport>,
    next_message_id: AtomicU32,
}

impl NodeContext {
    pub fn new(
        keypair: Keypair,
        address: PeerAddress,
        config: NodeConfig,
        peer_map: Arc<dyn PeerStatusListener>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        // Correlation ids start at a random offset per node
        let next_message_id = AtomicU32::new(rand::random());
        let inner = ContextInner { keypair, address, config, peer_map, transport, next_message_id };
        Self { inner: Arc::new(inner) }
    }

    pub fn keypair(&self) -> &Keypair {
        &self.inner.keypair
    }

    pub fn address(&self) -> &PeerAddress {
        &self.inner.address
    }

    pub fn config(&self) -> &NodeConfig {
        &self.inner.config
    }

    pub fn peer_map(&self) -> &Arc<dyn PeerStatusListener> {
        &self.inner.peer_map
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.inner.transport
    }

    /// Create a new outbound message from this node with a fresh correlation id.
    pub fn create_message(&self, recipient: &PeerAddress, command: Command, message_type: MessageType) -> Message {
        let id = self.inner.next_message_id.fetch_add(1, Ordering::Relaxed);
        Message::new(command, message_type, self.inner.address.clone(), recipient.clone(), id)
    }

    /// Create the reply to `request`, sent from this node.
    pub fn create_reply(&self, request: &Message, message_type: MessageType) -> Message {
        Message::reply_to(request, self.inner.address.clone(), message_type)
    }

    pub fn sign(&self, message: &mut Message) -> Result<(), SignatureError> {
        attach_signature(message, &self.inner.keypair)
    }
}
