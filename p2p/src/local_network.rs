//! An in-process [`Transport`].
//!
//! All peers that share a [`LocalNetwork`] can reach each other. Requests are delivered to the recipient's
//! [`Dispatcher`] on a task of the tokio runtime the network was created on, so senders never block, and replies come
//! back to the waiting [`ResponseListener`] on that same task.
//!
//! Peers can be marked unreachable to simulate a partition: requests to them vanish and the sender only finds out when
//! its timeout expires.

use crate::dispatcher::Dispatcher;
use crate::errors::TransportError;
use crate::transport::{ResponseListener, Transport};
use libp2p::PeerId;
use libpeerwire::{Message, ResponseError};
use log::*;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock, Weak};
use std::time::Duration;
use tokio::runtime::Handle;

#[derive(Clone)]
pub struct LocalNetwork {
    inner: Arc<NetworkInner>,
}

struct NetworkInner {
    runtime: Handle,
    peers: RwLock<HashMap<PeerId, Weak<Dispatcher>>>,
    unreachable: RwLock<HashSet<PeerId>>,
}

impl LocalNetwork {
    /// Create a network driven by the tokio runtime of the calling context.
    pub fn new() -> Result<Self, TransportError> {
        let runtime = Handle::try_current().map_err(|_| TransportError::NoRuntime)?;
        Ok(Self::with_runtime(runtime))
    }

    pub fn with_runtime(runtime: Handle) -> Self {
        let inner = NetworkInner {
            runtime,
            peers: RwLock::new(HashMap::new()),
            unreachable: RwLock::new(HashSet::new()),
        };
        Self { inner: Arc::new(inner) }
    }

    /// Make `dispatcher` reachable under `peer_id`. The network does not keep the dispatcher alive.
    pub fn register(&self, peer_id: PeerId, dispatcher: &Arc<Dispatcher>) {
        let mut peers = self.inner.peers.write().unwrap_or_else(PoisonError::into_inner);
        peers.insert(peer_id, Arc::downgrade(dispatcher));
        debug!("Peer {peer_id} joined the local network");
    }

    pub fn unregister(&self, peer_id: &PeerId) -> bool {
        let removed = self.inner.peers.write().unwrap_or_else(PoisonError::into_inner).remove(peer_id).is_some();
        if removed {
            debug!("Peer {peer_id} left the local network");
        }
        removed
    }

    /// Simulate a partition: while `unreachable`, everything sent to `peer_id` is silently dropped.
    pub fn set_unreachable(&self, peer_id: PeerId, unreachable: bool) {
        let mut set = self.inner.unreachable.write().unwrap_or_else(PoisonError::into_inner);
        if unreachable {
            set.insert(peer_id);
        } else {
            set.remove(&peer_id);
        }
    }

    fn is_unreachable(&self, peer_id: &PeerId) -> bool {
        self.inner.unreachable.read().unwrap_or_else(PoisonError::into_inner).contains(peer_id)
    }

    fn dispatcher(&self, peer_id: &PeerId) -> Result<Arc<Dispatcher>, TransportError> {
        let peers = self.inner.peers.read().unwrap_or_else(PoisonError::into_inner);
        peers.get(peer_id).and_then(Weak::upgrade).ok_or(TransportError::ConnectionRefused(*peer_id))
    }

    async fn exchange(&self, message: Message) -> Result<Message, TransportError> {
        let recipient = *message.recipient().peer_id();
        let dispatcher = self.dispatcher(&recipient)?;
        if self.is_unreachable(&recipient) {
            trace!("Dropping {message}: {recipient} is unreachable");
            return futures::future::pending().await;
        }
        tokio::task::yield_now().await;
        dispatcher.dispatch(message).ok_or(TransportError::NoReply(recipient))
    }

    fn spawn_exchange(&self, listener: Arc<dyn ResponseListener>, message: Message, timeout: Duration) {
        let network = self.clone();
        self.inner.runtime.spawn(async move {
            match tokio::time::timeout(timeout, network.exchange(message)).await {
                Ok(Ok(reply)) => listener.on_message_received(reply),
                Ok(Err(err)) => listener.on_failure(ResponseError::transport(err.to_string())),
                Err(_) => listener.on_failure(ResponseError::Timeout(timeout)),
            }
        });
    }
}

impl Transport for LocalNetwork {
    fn send_tcp(&self, listener: Arc<dyn ResponseListener>, message: Message, idle_timeout: Duration) {
        trace!("TCP send {message}");
        self.spawn_exchange(listener, message, idle_timeout);
    }

    fn send_udp(&self, listener: Arc<dyn ResponseListener>, message: Message, timeout: Duration) {
        trace!("UDP send {message}");
        self.spawn_exchange(listener, message, timeout);
    }

    fn fire_and_forget(&self, message: Message) -> Result<(), TransportError> {
        let recipient = *message.recipient().peer_id();
        let dispatcher = self.dispatcher(&recipient)?;
        if self.is_unreachable(&recipient) {
            trace!("Dropping {message}: {recipient} is unreachable");
            return Ok(());
        }
        self.inner.runtime.spawn(async move {
            if let Some(reply) = dispatcher.dispatch(message) {
                trace!("Nobody waits for {reply}. Dropping it");
            }
        });
        Ok(())
    }
}
