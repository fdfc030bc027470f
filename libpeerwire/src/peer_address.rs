use libp2p::identity::Keypair;
use libp2p::{Multiaddr, PeerId};
use std::fmt::{Display, Formatter};

/// The identity and network location of a peer.
///
/// Two addresses refer to the same peer when their [`PeerId`]s match; the multiaddress is only a hint on how to reach
/// the peer and may change over the lifetime of a node (e.g. behind a NAT).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PeerAddress {
    peer_id: PeerId,
    address: Multiaddr,
}

impl PeerAddress {
    pub fn new(peer_id: PeerId, address: Multiaddr) -> Self {
        Self { peer_id, address }
    }

    /// Derive the address of the local node from its keypair.
    pub fn from_keypair(keypair: &Keypair, address: Multiaddr) -> Self {
        Self::new(keypair.public().to_peer_id(), address)
    }

    pub fn peer_id(&self) -> &PeerId {
        &self.peer_id
    }

    pub fn address(&self) -> &Multiaddr {
        &self.address
    }

    /// True if both addresses point at the same peer identity, regardless of network location.
    pub fn same_peer(&self, other: &PeerAddress) -> bool {
        self.peer_id == other.peer_id
    }
}

impl Display for PeerAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.peer_id, self.address)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn same_peer_ignores_location() {
        let keypair = Keypair::generate_ed25519();
        let a = PeerAddress::from_keypair(&keypair, "/ip4/127.0.0.1/tcp/4000".parse().unwrap());
        let b = PeerAddress::from_keypair(&keypair, "/ip4/10.0.0.1/udp/4001".parse().unwrap());
        assert_ne!(a, b);
        assert!(a.same_peer(&b));
        let other = PeerAddress::from_keypair(&Keypair::generate_ed25519(), a.address().clone());
        assert!(!a.same_peer(&other));
    }
}
