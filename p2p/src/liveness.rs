//! Peer liveness bookkeeping.
//!
//! Request correlators report what they observe about remote peers to a [`PeerStatusListener`]: a reply proves the peer
//! is alive, an undeliverable request suggests it is gone. [`PeerMap`] is the in-memory implementation used by a node.

use chrono::{DateTime, Utc};
use libp2p::PeerId;
use libpeerwire::PeerAddress;
use log::*;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Receives liveness observations. Implementations are shared between many concurrent requests and must serialise
/// their own updates.
pub trait PeerStatusListener: Send + Sync {
    /// `peer` answered a request. `round_trip` is the time between sending the request and receiving the reply.
    fn peer_online(&self, peer: &PeerAddress, round_trip: Option<Duration>);

    /// A request to `peer` failed. With `force`, the peer is removed straight away; otherwise the failure is counted
    /// and the peer is only removed once it has failed too often. Returns true if the peer was removed.
    fn peer_offline(&self, peer: &PeerAddress, force: bool) -> bool;
}

#[derive(Clone, Debug)]
pub struct PeerStatistic {
    pub address: PeerAddress,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub last_round_trip: Option<Duration>,
    pub seen_count: u64,
}

impl PeerStatistic {
    fn new(address: PeerAddress) -> Self {
        let now = Utc::now();
        Self { address, first_seen: now, last_seen: now, last_round_trip: None, seen_count: 0 }
    }
}

#[derive(Default)]
struct PeerMapState {
    online: HashMap<PeerId, PeerStatistic>,
    offline: HashMap<PeerId, DateTime<Utc>>,
    failures: HashMap<PeerId, u32>,
}

/// Thread-safe registry of peers that are known to be online, and of those recently declared offline.
pub struct PeerMap {
    self_id: PeerId,
    max_fail: u32,
    state: Mutex<PeerMapState>,
}

impl PeerMap {
    pub fn new(self_id: PeerId, max_fail: u32) -> Self {
        Self { self_id, max_fail: max_fail.max(1), state: Mutex::new(PeerMapState::default()) }
    }

    fn lock(&self) -> MutexGuard<'_, PeerMapState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_online(&self, peer: &PeerId) -> bool {
        self.lock().online.contains_key(peer)
    }

    /// True if the peer was removed and has not been seen since.
    pub fn is_offline(&self, peer: &PeerId) -> bool {
        self.lock().offline.contains_key(peer)
    }

    pub fn online_peers(&self) -> Vec<PeerAddress> {
        self.lock().online.values().map(|s| s.address.clone()).collect()
    }

    pub fn statistic(&self, peer: &PeerId) -> Option<PeerStatistic> {
        self.lock().online.get(peer).cloned()
    }

    /// The number of non-forced failures counted against `peer` since it was last seen.
    pub fn failures(&self, peer: &PeerId) -> u32 {
        self.lock().failures.get(peer).copied().unwrap_or(0)
    }
}

impl PeerStatusListener for PeerMap {
    fn peer_online(&self, peer: &PeerAddress, round_trip: Option<Duration>) {
        if *peer.peer_id() == self.self_id {
            return;
        }
        let mut state = self.lock();
        state.offline.remove(peer.peer_id());
        state.failures.remove(peer.peer_id());
        let stat = state.online.entry(*peer.peer_id()).or_insert_with(|| {
            debug!("Peer {peer} is now online");
            PeerStatistic::new(peer.clone())
        });
        stat.address = peer.clone();
        stat.last_seen = Utc::now();
        stat.seen_count += 1;
        if round_trip.is_some() {
            stat.last_round_trip = round_trip;
        }
    }

    fn peer_offline(&self, peer: &PeerAddress, force: bool) -> bool {
        if *peer.peer_id() == self.self_id {
            return false;
        }
        let mut state = self.lock();
        let id = *peer.peer_id();
        if !force {
            let count = state.failures.entry(id).or_insert(0);
            *count += 1;
            if *count < self.max_fail {
                trace!("Peer {peer} failed {count}/{} times", self.max_fail);
                return false;
            }
        }
        state.failures.remove(&id);
        state.online.remove(&id);
        state.offline.insert(id, Utc::now());
        debug!("Peer {peer} is now offline (forced: {force})");
        true
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use libp2p::identity::Keypair;

    fn address() -> PeerAddress {
        PeerAddress::from_keypair(&Keypair::generate_ed25519(), "/ip4/127.0.0.1/tcp/4000".parse().unwrap())
    }

    #[test]
    fn online_refreshes_statistics() {
        let map = PeerMap::new(*address().peer_id(), 3);
        let peer = address();
        map.peer_online(&peer, None);
        map.peer_online(&peer, Some(Duration::from_millis(12)));
        map.peer_online(&peer, None);
        let stat = map.statistic(peer.peer_id()).expect("peer should be online");
        assert_eq!(stat.seen_count, 3);
        assert_eq!(stat.last_round_trip, Some(Duration::from_millis(12)));
        assert!(stat.last_seen >= stat.first_seen);
        assert_eq!(map.online_peers(), vec![peer]);
    }

    #[test]
    fn forced_offline_removes_immediately() {
        let map = PeerMap::new(*address().peer_id(), 3);
        let peer = address();
        map.peer_online(&peer, None);
        assert!(map.peer_offline(&peer, true));
        assert!(!map.is_online(peer.peer_id()));
        assert!(map.is_offline(peer.peer_id()));
        map.peer_online(&peer, None);
        assert!(!map.is_offline(peer.peer_id()));
    }

    #[test]
    fn soft_failures_accumulate() {
        let map = PeerMap::new(*address().peer_id(), 3);
        let peer = address();
        map.peer_online(&peer, None);
        assert!(!map.peer_offline(&peer, false));
        assert!(!map.peer_offline(&peer, false));
        assert_eq!(map.failures(peer.peer_id()), 2);
        assert!(map.is_online(peer.peer_id()));
        assert!(map.peer_offline(&peer, false));
        assert!(!map.is_online(peer.peer_id()));
        assert_eq!(map.failures(peer.peer_id()), 0);
    }

    #[test]
    fn a_reply_clears_failures() {
        let map = PeerMap::new(*address().peer_id(), 3);
        let peer = address();
        map.peer_offline(&peer, false);
        map.peer_online(&peer, None);
        assert_eq!(map.failures(peer.peer_id()), 0);
    }

    #[test]
    fn ignores_itself() {
        let me = address();
        let map = PeerMap::new(*me.peer_id(), 1);
        map.peer_online(&me, None);
        assert!(map.online_peers().is_empty());
        assert!(!map.peer_offline(&me, true));
    }
}
