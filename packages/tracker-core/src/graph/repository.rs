//! The in-memory network repository.
//!
//! The one shared mutable thing in the tracker is the overlay graph. This
//! wrapper owns it behind a lock: every mutation serializes through the
//! write half, so no two graph mutations are ever observable at the same
//! time, and reads see a consistent snapshot. Methods keep the critical
//! section to the graph work itself; anything expensive (the per-layer
//! public-key operations in particular) runs on data copied out first.
use std::collections::{BTreeMap, BTreeSet};
use std::net::IpAddr;

use anomos_tracker_primitives::info_hash::InfoHash;
use anomos_tracker_primitives::neighbor_id::NeighborId;
use anomos_tracker_primitives::peer_id::PeerId;
use anomos_tracker_primitives::swarm_metadata::SwarmMetadata;
use anomos_tracker_primitives::DurationSinceUnixEpoch;
use parking_lot::RwLock;

use super::network::Network;
use super::path_finder::PathSpec;
use super::sim_peer::{MembershipUpdate, SimPeer};
use crate::crypto::keys::OnionPublicKey;
use crate::onion::HopInfo;
use crate::state::{PeerRecord, StateSnapshot};

/// One neighbor as described to its peer in an announce reply: the
/// endpoint to dial and the relative id to address it by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborListEntry {
    pub ip: IpAddr,
    pub port: u16,
    pub nid: NeighborId,
}

/// The in-memory overlay graph repository.
#[derive(Default)]
pub struct InMemoryNetwork {
    network: RwLock<Network>,
}

impl InMemoryNetwork {
    /// A repository whose graph replays random decisions deterministically.
    /// For tests.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            network: RwLock::new(Network::with_seed(seed)),
        }
    }

    #[must_use]
    pub fn contains(&self, peer_id: &PeerId) -> bool {
        self.network.read().contains(peer_id)
    }

    #[must_use]
    pub fn peer_count(&self) -> usize {
        self.network.read().peer_count()
    }

    /// Registers a peer and wires its initial neighbors. Returns `false`
    /// when the peer was already registered (nothing changes then).
    pub fn register_peer(
        &self,
        peer_id: PeerId,
        public_key: OnionPublicKey,
        ip: IpAddr,
        port: u16,
        num_neighbors: usize,
        assume_reachable: bool,
    ) -> bool {
        let mut network = self.network.write();
        if network.contains(&peer_id) {
            return false;
        }
        let _session_id = network.init_peer(peer_id, public_key, ip, port, num_neighbors, assume_reachable);
        true
    }

    /// Applies the membership part of an announce.
    pub fn update_membership(&self, peer_id: &PeerId, update: &MembershipUpdate) {
        self.network.write().update_membership(peer_id, update);
    }

    /// Offers replacement neighbors for the edges a peer reported failed.
    /// Returns how many replacements could actually be wired.
    pub fn offer_replacements(&self, peer_id: &PeerId) -> usize {
        let mut network = self.network.write();
        let needed = match network.get(peer_id) {
            Some(peer) => peer.needs_neighbors(),
            None => return 0,
        };
        if needed == 0 {
            return 0;
        }
        let connected = network.rand_connect(peer_id, needed);
        if let Some(peer) = network.get_mut(peer_id) {
            peer.replacements_offered(needed);
        }
        connected
    }

    /// Removes a peer and every edge incident to it.
    pub fn disconnect(&self, peer_id: &PeerId) {
        self.network.write().disconnect(peer_id);
    }

    /// The peer's current neighbors, capped at `limit` entries.
    #[must_use]
    pub fn neighbor_list(&self, peer_id: &PeerId, limit: usize) -> Vec<NeighborListEntry> {
        let network = self.network.read();
        let Some(peer) = network.get(peer_id) else {
            return Vec::new();
        };
        peer.neighbors()
            .values()
            .take(limit)
            .map(|edge| NeighborListEntry {
                ip: edge.ip,
                port: edge.port,
                nid: edge.nid,
            })
            .collect()
    }

    /// Whether the peer currently seeds the given swarm.
    #[must_use]
    pub fn is_seeding(&self, peer_id: &PeerId, info_hash: &InfoHash) -> bool {
        self.network
            .read()
            .get(peer_id)
            .is_some_and(|peer| peer.is_seeding(info_hash))
    }

    /// The scrape counters for one swarm.
    #[must_use]
    pub fn swarm_metadata(&self, info_hash: &InfoHash) -> SwarmMetadata {
        let network = self.network.read();
        let complete = u32::try_from(network.seeders(info_hash).len()).unwrap_or(u32::MAX);
        let incomplete = u32::try_from(network.downloaders(info_hash).len()).unwrap_or(u32::MAX);
        SwarmMetadata {
            complete,
            downloaded: network.completed_count(info_hash),
            incomplete,
        }
    }

    /// Info hashes with at least one active peer or a completed counter.
    #[must_use]
    pub fn tracked_swarms(&self) -> BTreeSet<InfoHash> {
        let network = self.network.read();
        let mut swarms: BTreeSet<InfoHash> = network.completed_counts().keys().copied().collect();
        for (_, peer) in network.peers() {
            swarms.extend(peer.memberships().keys().copied());
        }
        swarms
    }

    /// Searches paths and copies out everything the onion builder needs.
    ///
    /// Each returned chain covers the full path, the source included as
    /// the first forwarder: the source peels the outer layer itself to
    /// learn which of its neighbors the code goes to.
    #[must_use]
    pub fn path_hops(&self, source: &PeerId, info_hash: &InfoHash, spec: &PathSpec) -> Vec<Vec<HopInfo>> {
        let mut network = self.network.write();
        let paths = network.find_paths(source, info_hash, spec);
        paths.iter().filter_map(|path| hops_for(&network, path)).collect()
    }

    /// Marks a peer as reachable after a successful connect-back probe.
    pub fn set_reachable(&self, peer_id: &PeerId) {
        if let Some(peer) = self.network.write().get_mut(peer_id) {
            peer.set_reachable();
        }
    }

    /// Records a failed connect-back probe; returns the attempt count.
    pub fn record_nat_probe_failure(&self, peer_id: &PeerId) -> Option<u8> {
        self.network.write().get_mut(peer_id).map(SimPeer::record_nat_probe_failure)
    }

    /// Whether the peer is still flagged as NAT'd.
    #[must_use]
    pub fn is_natted(&self, peer_id: &PeerId) -> Option<bool> {
        self.network.read().get(peer_id).map(SimPeer::is_natted)
    }

    /// How many connect-back probes have failed for the peer so far.
    #[must_use]
    pub fn nat_probes(&self, peer_id: &PeerId) -> Option<u8> {
        self.network.read().get(peer_id).map(SimPeer::nat_probes)
    }

    /// The endpoint a connect-back probe should dial.
    #[must_use]
    pub fn endpoint(&self, peer_id: &PeerId) -> Option<(IpAddr, u16)> {
        self.network.read().get(peer_id).map(|peer| (peer.ip(), peer.port()))
    }

    /// Expires peers not seen since `cutoff` and, unless `keep_dead`,
    /// drops counters of swarms that ended up empty (except `retain`).
    /// Returns the expired peer ids.
    pub fn expire_idle_peers(
        &self,
        cutoff: DurationSinceUnixEpoch,
        keep_dead: bool,
        retain: &BTreeSet<InfoHash>,
    ) -> Vec<PeerId> {
        let mut network = self.network.write();
        let removed = network.expire_peers(cutoff);
        if !keep_dead {
            network.prune_dead_swarms(retain);
        }
        removed
    }

    /// Takes a consistent snapshot for the state file.
    #[must_use]
    pub fn state_snapshot(&self, allowed: BTreeMap<InfoHash, String>) -> StateSnapshot {
        let network = self.network.read();

        let mut peers: BTreeMap<InfoHash, BTreeMap<PeerId, PeerRecord>> = BTreeMap::new();
        for (peer_id, peer) in network.peers() {
            for (info_hash, membership) in peer.memberships() {
                peers.entry(*info_hash).or_default().insert(
                    *peer_id,
                    PeerRecord {
                        ip: peer.ip().to_string(),
                        port: peer.port(),
                        left: membership.left,
                    },
                );
            }
        }

        StateSnapshot {
            peers,
            completed: network.completed_counts().clone(),
            allowed,
        }
    }

    /// Imports the counters of a persisted snapshot.
    ///
    /// Peer records are not resurrected: sessions and keys are ephemeral
    /// by design, so the graph starts empty and refills as peers
    /// re-announce.
    pub fn import_state(&self, snapshot: &StateSnapshot) {
        let mut network = self.network.write();
        for (info_hash, count) in &snapshot.completed {
            network.import_completed(*info_hash, *count);
        }
    }
}

fn hops_for(network: &Network, path: &[PeerId]) -> Option<Vec<HopInfo>> {
    let mut hops = Vec::with_capacity(path.len());
    for (index, peer_id) in path.iter().enumerate() {
        let peer = network.get(peer_id)?;
        let next_nid = match path.get(index + 1) {
            Some(next) => Some(peer.nid_of(next)?),
            None => None,
        };
        hops.push(HopInfo {
            public_key: *peer.public_key(),
            session_id: *peer.session_id(),
            next_nid,
        });
    }
    Some(hops)
}

#[cfg(test)]
mod tests {

    mod the_in_memory_network {
        use std::net::{IpAddr, Ipv4Addr};

        use anomos_tracker_primitives::peer_id::PeerId;

        use crate::graph::repository::InMemoryNetwork;
        use crate::test_helpers::tests::sample_key_pair;

        pub fn numeric_peer_id(value: u8) -> PeerId {
            let mut bytes = [0u8; 20];
            bytes[19] = value;
            PeerId::from(bytes)
        }

        pub fn register(network: &InMemoryNetwork, value: u8, num_neighbors: usize) -> PeerId {
            let peer_id = numeric_peer_id(value);
            network.register_peer(
                peer_id,
                *sample_key_pair(value.into()).public(),
                IpAddr::V4(Ipv4Addr::new(126, 0, 0, value)),
                8000 + u16::from(value),
                num_neighbors,
                true,
            );
            peer_id
        }

        mod registering_peers {
            use super::register;
            use crate::graph::repository::InMemoryNetwork;

            #[test]
            fn the_first_registration_should_create_the_peer() {
                let network = InMemoryNetwork::with_seed(1);

                let peer_id = register(&network, 1, 0);

                assert!(network.contains(&peer_id));
            }

            #[test]
            fn a_second_registration_should_be_a_no_op() {
                let network = InMemoryNetwork::with_seed(1);

                let peer_id = register(&network, 1, 0);
                let created = network.register_peer(
                    peer_id,
                    *crate::test_helpers::tests::sample_key_pair(1).public(),
                    std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                    9999,
                    0,
                    true,
                );

                assert!(!created);
                assert_eq!(network.peer_count(), 1);
            }
        }

        mod describing_neighbors {
            use super::register;
            use crate::graph::repository::InMemoryNetwork;

            #[test]
            fn the_neighbor_list_should_carry_endpoint_and_relative_id() {
                let network = InMemoryNetwork::with_seed(1);
                let _a = register(&network, 1, 0);
                let b = register(&network, 2, 1);

                let neighbors = network.neighbor_list(&b, 50);

                assert_eq!(neighbors.len(), 1);
                assert_eq!(neighbors[0].ip, std::net::IpAddr::V4(std::net::Ipv4Addr::new(126, 0, 0, 1)));
                assert_eq!(neighbors[0].port, 8001);
            }

            #[test]
            fn the_list_should_respect_the_cap() {
                let network = InMemoryNetwork::with_seed(1);
                for value in 1..=10 {
                    register(&network, value, 0);
                }
                let newcomer = register(&network, 11, 10);

                let neighbors = network.neighbor_list(&newcomer, 3);

                assert_eq!(neighbors.len(), 3);
            }
        }

        mod expiring_idle_peers {
            use std::collections::BTreeSet;
            use std::time::Duration;

            use anomos_tracker_clock::clock::stopped::Stopped as _;
            use anomos_tracker_clock::clock::{self};
            use anomos_tracker_primitives::event::AnnounceEvent;

            use super::register;
            use crate::graph::repository::InMemoryNetwork;
            use crate::graph::sim_peer::MembershipUpdate;
            use crate::test_helpers::tests::sample_info_hash;

            #[test]
            fn peers_not_seen_since_the_cutoff_should_be_expired() {
                clock::Stopped::local_set(&Duration::from_secs(0));

                let network = InMemoryNetwork::with_seed(1);
                let early = register(&network, 1, 0);

                clock::Stopped::local_add(&Duration::from_secs(100)).unwrap();
                let late = register(&network, 2, 0);

                let expired = network.expire_idle_peers(Duration::from_secs(50), false, &BTreeSet::new());

                assert_eq!(expired, vec![early]);
                assert!(!network.contains(&early));
                assert!(network.contains(&late));
            }

            #[test]
            fn counters_of_emptied_swarms_should_be_pruned_unless_kept() {
                clock::Stopped::local_set(&Duration::from_secs(0));

                let network = InMemoryNetwork::with_seed(1);
                let peer_id = register(&network, 1, 0);
                network.update_membership(
                    &peer_id,
                    &MembershipUpdate {
                        event: AnnounceEvent::Completed,
                        info_hash: sample_info_hash(),
                        downloaded: 100,
                        left: 0,
                        failed: vec![],
                    },
                );

                clock::Stopped::local_add(&Duration::from_secs(100)).unwrap();

                let _expired = network.expire_idle_peers(Duration::from_secs(50), false, &BTreeSet::new());

                assert_eq!(network.swarm_metadata(&sample_info_hash()).downloaded, 0);
            }

            #[test]
            fn counters_should_survive_when_keep_dead_is_set() {
                clock::Stopped::local_set(&Duration::from_secs(0));

                let network = InMemoryNetwork::with_seed(1);
                let peer_id = register(&network, 1, 0);
                network.update_membership(
                    &peer_id,
                    &MembershipUpdate {
                        event: AnnounceEvent::Completed,
                        info_hash: sample_info_hash(),
                        downloaded: 100,
                        left: 0,
                        failed: vec![],
                    },
                );

                clock::Stopped::local_add(&Duration::from_secs(100)).unwrap();

                let _expired = network.expire_idle_peers(Duration::from_secs(50), true, &BTreeSet::new());

                assert_eq!(network.swarm_metadata(&sample_info_hash()).downloaded, 1);
            }
        }

        mod snapshotting_state {
            use std::collections::BTreeMap;

            use anomos_tracker_primitives::event::AnnounceEvent;

            use super::register;
            use crate::graph::repository::InMemoryNetwork;
            use crate::graph::sim_peer::MembershipUpdate;
            use crate::test_helpers::tests::sample_info_hash;

            #[test]
            fn the_snapshot_should_list_members_per_swarm() {
                let network = InMemoryNetwork::with_seed(1);
                let peer_id = register(&network, 1, 0);
                network.update_membership(
                    &peer_id,
                    &MembershipUpdate {
                        event: AnnounceEvent::Started,
                        info_hash: sample_info_hash(),
                        downloaded: 0,
                        left: 100,
                        failed: vec![],
                    },
                );

                let snapshot = network.state_snapshot(BTreeMap::new());

                let members = snapshot.peers.get(&sample_info_hash()).unwrap();
                assert_eq!(members.get(&peer_id).unwrap().left, 100);
            }

            #[test]
            fn importing_a_snapshot_should_restore_completed_counters_only() {
                let network = InMemoryNetwork::with_seed(1);
                let donor = InMemoryNetwork::with_seed(2);
                let peer_id = register(&donor, 1, 0);
                donor.update_membership(
                    &peer_id,
                    &MembershipUpdate {
                        event: AnnounceEvent::Completed,
                        info_hash: sample_info_hash(),
                        downloaded: 100,
                        left: 0,
                        failed: vec![],
                    },
                );

                let snapshot = donor.state_snapshot(BTreeMap::new());
                network.import_state(&snapshot);

                assert_eq!(network.swarm_metadata(&sample_info_hash()).downloaded, 1);
                assert_eq!(network.peer_count(), 0);
            }
        }
    }
}
