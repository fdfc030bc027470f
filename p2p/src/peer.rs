use crate::context::NodeContext;
use crate::direct_data::DirectDataRpc;
use crate::dispatcher::Dispatcher;
use crate::liveness::PeerMap;
use crate::local_network::LocalNetwork;
use crate::ping::PingRpc;
use libp2p::identity::Keypair;
use libp2p::{Multiaddr, PeerId};
use libpeerwire::{NodeConfig, PeerAddress};
use log::*;
use std::fmt::{Debug, Display};
use std::sync::Arc;

/// A node on a [`LocalNetwork`]: its identity, liveness view, and the RPCs it serves and uses.
pub struct Peer {
    context: NodeContext,
    network: LocalNetwork,
    peer_map: Arc<PeerMap>,
    dispatcher: Arc<Dispatcher>,
    direct_data: Arc<DirectDataRpc>,
    ping: Arc<PingRpc>,
}

impl Peer {
    /// Create a peer listening at `address` and join it to `network`.
    pub fn new(keypair: Keypair, address: Multiaddr, config: NodeConfig, network: &LocalNetwork) -> Self {
        let local = PeerAddress::from_keypair(&keypair, address);
        let peer_map = Arc::new(PeerMap::new(*local.peer_id(), config.max_fail));
        let dispatcher = Arc::new(Dispatcher::new(local.clone(), keypair.clone(), config.sign_responses));
        let transport = Arc::new(network.clone());
        let context = NodeContext::new(keypair, local, config, peer_map.clone(), transport);
        let direct_data = Arc::new(DirectDataRpc::new(context.clone()));
        let ping = Arc::new(PingRpc::new(context.clone()));
        dispatcher.register(direct_data.clone());
        dispatcher.register(ping.clone());
        network.register(*context.address().peer_id(), &dispatcher);
        info!("Peer {} started", context.address());
        Self { context, network: network.clone(), peer_map, dispatcher, direct_data, ping }
    }

    /// Create a peer with a fresh ed25519 identity.
    pub fn random(address: Multiaddr, config: NodeConfig, network: &LocalNetwork) -> Self {
        Self::new(Keypair::generate_ed25519(), address, config, network)
    }

    pub fn address(&self) -> &PeerAddress {
        self.context.address()
    }

    pub fn peer_id(&self) -> PeerId {
        *self.context.address().peer_id()
    }

    pub fn context(&self) -> &NodeContext {
        &self.context
    }

    pub fn peer_map(&self) -> &PeerMap {
        &self.peer_map
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn direct_data(&self) -> &DirectDataRpc {
        &self.direct_data
    }

    pub fn ping(&self) -> &PingRpc {
        &self.ping
    }

    /// Leave the network. Requests to this peer are refused from now on. Returns false if it had already left.
    pub fn shutdown(&self) -> bool {
        let left = self.network.unregister(&self.peer_id());
        if left {
            info!("Peer {} shut down", self.address());
        }
        left
    }
}

impl Display for Peer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.address())
    }
}

impl Debug for Peer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Peer({self})")
    }
}
