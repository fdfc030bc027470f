use libpeerwire::NodeConfig;
use peerwire_p2p::{LocalNetwork, Peer};
use std::time::Duration;

pub const SHORT_TIMEOUT: Duration = Duration::from_millis(150);

/// A set of peers sharing one in-process network.
pub struct Swarm {
    pub network: LocalNetwork,
    pub peers: Vec<Peer>,
}

impl Swarm {
    pub fn new(size: usize) -> Self {
        Self::with_configs((0..size).map(|_| NodeConfig::default()).collect())
    }

    /// One peer per config. Must be called from within a tokio runtime.
    pub fn with_configs(configs: Vec<NodeConfig>) -> Self {
        let _ = env_logger::try_init();
        let network = LocalNetwork::new().expect("tests run inside a tokio runtime");
        let peers = configs
            .into_iter()
            .enumerate()
            .map(|(i, config)| {
                let address = format!("/ip4/127.0.0.1/tcp/{}", 7000 + i).parse().expect("valid multiaddr");
                Peer::random(address, config, &network)
            })
            .collect();
        Self { network, peers }
    }

    pub fn pair(&self) -> (&Peer, &Peer) {
        (&self.peers[0], &self.peers[1])
    }
}
