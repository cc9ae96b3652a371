//! The overlay graph itself.
use std::collections::{BTreeMap, BTreeSet};
use std::net::IpAddr;

use anomos_tracker_primitives::event::AnnounceEvent;
use anomos_tracker_primitives::info_hash::InfoHash;
use anomos_tracker_primitives::neighbor_id::NeighborId;
use anomos_tracker_primitives::peer_id::PeerId;
use anomos_tracker_primitives::session_id::SessionId;
use anomos_tracker_primitives::DurationSinceUnixEpoch;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::path_finder::{self, PathSpec};
use super::sim_peer::{MembershipUpdate, SimPeer};
use crate::crypto::keys::OnionPublicKey;
use crate::error::ConnectError;

/// The graph: an arena of peers keyed by peer id, the per-swarm completed
/// download counters, and the single RNG behind every random decision.
///
/// All tie-breaks (neighbor id choice, initial neighbor selection, path
/// choices) draw from the one RNG, so a seeded instance replays the same
/// wiring decisions. The arena is ordered, which keeps candidate
/// enumeration deterministic before the shuffle.
pub struct Network {
    peers: BTreeMap<PeerId, SimPeer>,
    completed: BTreeMap<InfoHash, u32>,
    rng: StdRng,
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

impl Network {
    #[must_use]
    pub fn new() -> Self {
        Self {
            peers: BTreeMap::new(),
            completed: BTreeMap::new(),
            rng: StdRng::from_entropy(),
        }
    }

    /// A graph whose random decisions replay deterministically. For tests.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            peers: BTreeMap::new(),
            completed: BTreeMap::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    #[must_use]
    pub fn get(&self, peer_id: &PeerId) -> Option<&SimPeer> {
        self.peers.get(peer_id)
    }

    #[must_use]
    pub fn get_mut(&mut self, peer_id: &PeerId) -> Option<&mut SimPeer> {
        self.peers.get_mut(peer_id)
    }

    #[must_use]
    pub fn contains(&self, peer_id: &PeerId) -> bool {
        self.peers.contains_key(peer_id)
    }

    #[must_use]
    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    pub fn peers(&self) -> impl Iterator<Item = (&PeerId, &SimPeer)> {
        self.peers.iter()
    }

    /// Registers a peer and wires it to up to `num_neighbors` random
    /// existing peers.
    ///
    /// The freshly issued session id is returned. When `assume_reachable`
    /// is set (NAT checking disabled) the peer is immediately eligible as a
    /// neighbor for others.
    pub fn init_peer(
        &mut self,
        peer_id: PeerId,
        public_key: OnionPublicKey,
        ip: IpAddr,
        port: u16,
        num_neighbors: usize,
        assume_reachable: bool,
    ) -> SessionId {
        let session_id = SessionId::generate(&mut self.rng);
        let mut peer = SimPeer::new(peer_id, public_key, ip, port, session_id);
        if assume_reachable {
            peer.set_reachable();
        }
        self.peers.insert(peer_id, peer);
        self.rand_connect(&peer_id, num_neighbors);
        session_id
    }

    /// Creates an edge between two peers under a neighbor id drawn
    /// uniformly from the intersection of both free sets. The same id is
    /// recorded on both sides.
    ///
    /// # Errors
    ///
    /// Fails without touching either peer when the endpoints coincide, one
    /// of them is unknown, or no common neighbor id is left. The failure is
    /// local to this edge.
    pub fn connect(&mut self, a: &PeerId, b: &PeerId) -> Result<NeighborId, ConnectError> {
        if a == b {
            return Err(ConnectError::SelfLoop { peer_id: *a });
        }

        let peer_a = self.peers.get(a).ok_or(ConnectError::PeerNotFound { peer_id: *a })?;
        let peer_b = self.peers.get(b).ok_or(ConnectError::PeerNotFound { peer_id: *b })?;

        let (a_ip, a_port) = (peer_a.ip(), peer_a.port());
        let (b_ip, b_port) = (peer_b.ip(), peer_b.port());

        let candidates: Vec<NeighborId> = peer_a
            .available_nids()
            .intersection(&peer_b.available_nids())
            .copied()
            .collect();

        let Some(nid) = candidates.choose(&mut self.rng).copied() else {
            return Err(ConnectError::NoAvailableNid { a: *a, b: *b });
        };

        self.peers
            .get_mut(a)
            .expect("endpoint was just read")
            .add_neighbor(*b, nid, b_ip, b_port);
        self.peers
            .get_mut(b)
            .expect("endpoint was just read")
            .add_neighbor(*a, nid, a_ip, a_port);

        Ok(nid)
    }

    /// Wires `peer_id` to up to `count` randomly chosen peers, walking a
    /// uniformly shuffled permutation of the arena and skipping itself,
    /// already-connected peers, previously failed peers and NAT'd peers.
    ///
    /// An edge that cannot be created (no common neighbor id) is skipped;
    /// the walk goes on until `count` connects succeeded or the candidates
    /// are exhausted. Returns the number of edges created.
    pub fn rand_connect(&mut self, peer_id: &PeerId, count: usize) -> usize {
        let Some(peer) = self.peers.get(peer_id) else {
            return 0;
        };

        let already_connected = peer.neighbor_ids();
        let failed = peer.failed_neighbors().clone();

        let mut candidates: Vec<PeerId> = self.peers.keys().copied().collect();
        candidates.shuffle(&mut self.rng);

        let mut connected = 0;
        for candidate in candidates {
            if connected >= count {
                break;
            }
            if candidate == *peer_id
                || already_connected.contains(&candidate)
                || failed.contains(&candidate)
                || self.peers.get(&candidate).is_some_and(SimPeer::is_natted)
            {
                continue;
            }
            match self.connect(peer_id, &candidate) {
                Ok(_) => connected += 1,
                Err(e) => {
                    tracing::debug!("skipping candidate neighbor: {e}");
                }
            }
        }
        connected
    }

    /// Removes a peer from the graph, cascading to every incident edge.
    pub fn disconnect(&mut self, peer_id: &PeerId) {
        let Some(peer) = self.peers.remove(peer_id) else {
            return;
        };
        for neighbor_id in peer.neighbor_ids() {
            if let Some(neighbor) = self.peers.get_mut(&neighbor_id) {
                neighbor.remove_neighbor(peer_id);
            }
        }
    }

    /// Applies the membership part of an announce to a registered peer.
    ///
    /// Edges reported as failed are dropped on both sides, keeping edge
    /// symmetry; the reporting side remembers the peer in its failed set so
    /// replacements never re-select it. A transition into seeding via a
    /// `completed` event bumps the swarm's completed counter.
    pub fn update_membership(&mut self, peer_id: &PeerId, update: &MembershipUpdate) {
        let Some(peer) = self.peers.get_mut(peer_id) else {
            return;
        };

        let was_seeding = peer.is_seeding(&update.info_hash);
        let dropped = peer.update(update);

        if update.event == AnnounceEvent::Completed && !was_seeding {
            *self.completed.entry(update.info_hash).or_insert(0) += 1;
        }

        for dropped_id in dropped {
            if let Some(other) = self.peers.get_mut(&dropped_id) {
                other.remove_neighbor(peer_id);
            }
        }
    }

    /// The set of peers currently sharing `info_hash`.
    #[must_use]
    pub fn swarm(&self, info_hash: &InfoHash) -> BTreeSet<PeerId> {
        self.peers
            .iter()
            .filter(|(_, peer)| peer.is_sharing(info_hash))
            .map(|(peer_id, _)| *peer_id)
            .collect()
    }

    /// The peers sharing `info_hash` that still have bytes left.
    #[must_use]
    pub fn downloaders(&self, info_hash: &InfoHash) -> BTreeSet<PeerId> {
        self.peers
            .iter()
            .filter(|(_, peer)| peer.is_sharing(info_hash) && !peer.is_seeding(info_hash))
            .map(|(peer_id, _)| *peer_id)
            .collect()
    }

    /// The peers seeding `info_hash`.
    #[must_use]
    pub fn seeders(&self, info_hash: &InfoHash) -> BTreeSet<PeerId> {
        self.peers
            .iter()
            .filter(|(_, peer)| peer.is_seeding(info_hash))
            .map(|(peer_id, _)| *peer_id)
            .collect()
    }

    /// How many completed downloads the tracker has seen for `info_hash`.
    #[must_use]
    pub fn completed_count(&self, info_hash: &InfoHash) -> u32 {
        self.completed.get(info_hash).copied().unwrap_or(0)
    }

    /// Overwrites a completed counter, used when importing persisted state.
    pub fn import_completed(&mut self, info_hash: InfoHash, count: u32) {
        self.completed.insert(info_hash, count);
    }

    /// All completed counters, for state snapshots.
    #[must_use]
    pub fn completed_counts(&self) -> &BTreeMap<InfoHash, u32> {
        &self.completed
    }

    /// Removes peers not seen since `cutoff`. Returns the removed ids.
    pub fn expire_peers(&mut self, cutoff: DurationSinceUnixEpoch) -> Vec<PeerId> {
        let idle: Vec<PeerId> = self
            .peers
            .iter()
            .filter(|(_, peer)| peer.last_seen() < cutoff)
            .map(|(peer_id, _)| *peer_id)
            .collect();
        for peer_id in &idle {
            self.disconnect(peer_id);
        }
        idle
    }

    /// Drops completed counters for swarms that no longer have peers,
    /// except those in `retain`.
    pub fn prune_dead_swarms(&mut self, retain: &BTreeSet<InfoHash>) {
        let dead: Vec<InfoHash> = self
            .completed
            .keys()
            .filter(|&info_hash| !retain.contains(info_hash) && self.swarm(info_hash).is_empty())
            .copied()
            .collect();
        for info_hash in dead {
            self.completed.remove(&info_hash);
        }
    }

    /// Up to `how_many` simple paths from `source` to peers in the
    /// `info_hash` swarm, each at least `min_hops` vertices long.
    pub fn find_paths(&mut self, source: &PeerId, info_hash: &InfoHash, spec: &PathSpec) -> Vec<Vec<PeerId>> {
        let Self { peers, rng, .. } = self;
        path_finder::find_paths(peers, rng, source, info_hash, spec)
    }
}
