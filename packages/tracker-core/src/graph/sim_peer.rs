//! The per-peer record.
use std::collections::{BTreeMap, BTreeSet};
use std::net::IpAddr;

use anomos_tracker_clock::clock::Time;
use anomos_tracker_primitives::event::AnnounceEvent;
use anomos_tracker_primitives::info_hash::InfoHash;
use anomos_tracker_primitives::neighbor_id::NeighborId;
use anomos_tracker_primitives::peer_id::PeerId;
use anomos_tracker_primitives::session_id::SessionId;
use anomos_tracker_primitives::DurationSinceUnixEpoch;

use crate::crypto::keys::OnionPublicKey;
use crate::CurrentClock;

/// One entry in a peer's neighbor table: the edge id plus the endpoint the
/// neighbor listens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeighborEdge {
    pub nid: NeighborId,
    pub ip: IpAddr,
    pub port: u16,
}

/// A peer's membership in one swarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SwarmMembership {
    pub downloaded: u64,

    /// Bytes still to download; `0` means the peer seeds this swarm.
    pub left: u64,
}

/// The membership part of an announce, already validated by the announce
/// layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipUpdate {
    pub event: AnnounceEvent,
    pub info_hash: InfoHash,
    pub downloaded: u64,
    pub left: u64,

    /// Neighbor ids the peer reports as unreachable.
    pub failed: Vec<NeighborId>,
}

/// Everything the tracker knows about one peer.
///
/// Also a vertex of the overlay graph used for tracking-code generation.
/// The `neighbors` table and the inverse `id_map` index are kept in lock
/// step: `id_map[n] == q` exactly when `neighbors[q].nid == n`.
pub struct SimPeer {
    peer_id: PeerId,
    public_key: OnionPublicKey,
    session_id: SessionId,
    ip: IpAddr,
    port: u16,
    neighbors: BTreeMap<PeerId, NeighborEdge>,
    id_map: BTreeMap<NeighborId, PeerId>,
    infohashes: BTreeMap<InfoHash, SwarmMembership>,
    failed_neighbors: BTreeSet<PeerId>,
    needs_neighbors: usize,
    last_seen: DurationSinceUnixEpoch,
    last_modified: DurationSinceUnixEpoch,

    /// Assumed behind a NAT until a connect-back probe succeeds.
    nat: bool,
    nat_probes: u8,
}

impl SimPeer {
    #[must_use]
    pub fn new(peer_id: PeerId, public_key: OnionPublicKey, ip: IpAddr, port: u16, session_id: SessionId) -> Self {
        let now = CurrentClock::now();
        Self {
            peer_id,
            public_key,
            session_id,
            ip,
            port,
            neighbors: BTreeMap::new(),
            id_map: BTreeMap::new(),
            infohashes: BTreeMap::new(),
            failed_neighbors: BTreeSet::new(),
            needs_neighbors: 0,
            last_seen: now,
            last_modified: now,
            nat: true,
            nat_probes: 0,
        }
    }

    #[must_use]
    pub fn peer_id(&self) -> &PeerId {
        &self.peer_id
    }

    #[must_use]
    pub fn public_key(&self) -> &OnionPublicKey {
        &self.public_key
    }

    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    #[must_use]
    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[must_use]
    pub fn last_seen(&self) -> DurationSinceUnixEpoch {
        self.last_seen
    }

    #[must_use]
    pub fn last_modified(&self) -> DurationSinceUnixEpoch {
        self.last_modified
    }

    /// Whether the peer is still assumed to be behind a NAT.
    #[must_use]
    pub fn is_natted(&self) -> bool {
        self.nat
    }

    /// Marks the peer as reachable from the outside.
    pub fn set_reachable(&mut self) {
        self.nat = false;
    }

    /// Records one failed connect-back probe and returns the new count.
    pub fn record_nat_probe_failure(&mut self) -> u8 {
        self.nat_probes = self.nat_probes.saturating_add(1);
        self.nat_probes
    }

    #[must_use]
    pub fn nat_probes(&self) -> u8 {
        self.nat_probes
    }

    /// How many replacement neighbors to offer on the next announce.
    #[must_use]
    pub fn needs_neighbors(&self) -> usize {
        self.needs_neighbors
    }

    /// Records that `count` replacements have been offered.
    pub fn replacements_offered(&mut self, count: usize) {
        self.needs_neighbors = self.needs_neighbors.saturating_sub(count);
    }

    /// Applies the membership part of an announce.
    ///
    /// Refreshes `last_seen`, moves reported-failed neighbors out of the
    /// neighbor table, and inserts or deletes the swarm membership. Failed
    /// neighbor ids the peer does not actually hold are ignored, like a
    /// [`remove_neighbor`](Self::remove_neighbor) of a missing entry.
    ///
    /// Returns the peer ids moved into `failed_neighbors`, so the graph can
    /// drop the other half of each edge.
    pub fn update(&mut self, update: &MembershipUpdate) -> Vec<PeerId> {
        self.last_seen = CurrentClock::now();

        let mut dropped = Vec::new();
        for nid in &update.failed {
            if let Some(peer_id) = self.mark_failed(*nid) {
                dropped.push(peer_id);
            }
        }

        match update.event {
            AnnounceEvent::Stopped => {
                self.infohashes.remove(&update.info_hash);
            }
            _ => {
                self.infohashes.insert(
                    update.info_hash,
                    SwarmMembership {
                        downloaded: update.downloaded,
                        left: update.left,
                    },
                );
            }
        }

        dropped
    }

    /// Assigns a neighbor id to a peer, inserting the edge if absent.
    ///
    /// A no-op when the peer is already a neighbor or the id is already
    /// bound, so the `neighbors`/`id_map` pairing can never be broken from
    /// here.
    pub fn add_neighbor(&mut self, peer_id: PeerId, nid: NeighborId, ip: IpAddr, port: u16) {
        if self.neighbors.contains_key(&peer_id) || self.id_map.contains_key(&nid) || peer_id == self.peer_id {
            return;
        }
        self.neighbors.insert(peer_id, NeighborEdge { nid, ip, port });
        self.id_map.insert(nid, peer_id);
        self.last_modified = CurrentClock::now();
    }

    /// Removes the connection to a neighbor. Tolerates missing entries.
    pub fn remove_neighbor(&mut self, peer_id: &PeerId) {
        if let Some(edge) = self.neighbors.remove(peer_id) {
            self.id_map.remove(&edge.nid);
            self.last_modified = CurrentClock::now();
        }
    }

    /// Moves the neighbor behind `nid` into the failed set and bumps the
    /// replacement counter. Returns the moved peer id, if the id was bound.
    pub fn mark_failed(&mut self, nid: NeighborId) -> Option<PeerId> {
        let peer_id = *self.id_map.get(&nid)?;
        self.failed_neighbors.insert(peer_id);
        self.remove_neighbor(&peer_id);
        self.needs_neighbors += 1;
        Some(peer_id)
    }

    /// The neighbor ids not currently bound at this peer.
    #[must_use]
    pub fn available_nids(&self) -> BTreeSet<NeighborId> {
        (0..=NeighborId::MAX)
            .map(|value| NeighborId::new(value).expect("values up to MAX are valid"))
            .filter(|nid| !self.id_map.contains_key(nid))
            .collect()
    }

    /// The relative id associated with `peer_id`, or `None` when the
    /// vertices are not connected.
    #[must_use]
    pub fn nid_of(&self, peer_id: &PeerId) -> Option<NeighborId> {
        self.neighbors.get(peer_id).map(|edge| edge.nid)
    }

    #[must_use]
    pub fn neighbors(&self) -> &BTreeMap<PeerId, NeighborEdge> {
        &self.neighbors
    }

    /// The peer ids of all current neighbors.
    #[must_use]
    pub fn neighbor_ids(&self) -> BTreeSet<PeerId> {
        self.neighbors.keys().copied().collect()
    }

    #[must_use]
    pub fn id_map(&self) -> &BTreeMap<NeighborId, PeerId> {
        &self.id_map
    }

    #[must_use]
    pub fn failed_neighbors(&self) -> &BTreeSet<PeerId> {
        &self.failed_neighbors
    }

    #[must_use]
    pub fn is_sharing(&self, info_hash: &InfoHash) -> bool {
        self.infohashes.contains_key(info_hash)
    }

    #[must_use]
    pub fn is_seeding(&self, info_hash: &InfoHash) -> bool {
        self.infohashes.get(info_hash).is_some_and(|membership| membership.left == 0)
    }

    #[must_use]
    pub fn membership(&self, info_hash: &InfoHash) -> Option<&SwarmMembership> {
        self.infohashes.get(info_hash)
    }

    /// All swarms the peer currently shares.
    #[must_use]
    pub fn memberships(&self) -> &BTreeMap<InfoHash, SwarmMembership> {
        &self.infohashes
    }

    #[must_use]
    pub fn num_torrents(&self) -> usize {
        self.infohashes.len()
    }
}

#[cfg(test)]
mod tests {

    mod the_sim_peer {
        use std::net::{IpAddr, Ipv4Addr};

        use anomos_tracker_primitives::neighbor_id::NeighborId;
        use anomos_tracker_primitives::peer_id::PeerId;

        use crate::graph::sim_peer::SimPeer;
        use crate::test_helpers::tests::{sample_key_pair, sample_peer_id, sample_session_id};

        fn sample_sim_peer() -> SimPeer {
            SimPeer::new(
                sample_peer_id(),
                *sample_key_pair(0).public(),
                IpAddr::V4(Ipv4Addr::new(126, 0, 0, 1)),
                8080,
                sample_session_id(),
            )
        }

        fn nid(value: u8) -> NeighborId {
            NeighborId::new(value).unwrap()
        }

        fn other_peer_id(value: u8) -> PeerId {
            let mut bytes = [0u8; 20];
            bytes[19] = value;
            PeerId::from(bytes)
        }

        mod maintaining_the_neighbor_table {
            use std::net::{IpAddr, Ipv4Addr};

            use super::{nid, other_peer_id, sample_sim_peer};

            fn neighbor_endpoint() -> (IpAddr, u16) {
                (IpAddr::V4(Ipv4Addr::new(126, 0, 0, 2)), 8081)
            }

            #[test]
            fn adding_a_neighbor_should_bind_the_id_on_both_indexes() {
                let mut peer = sample_sim_peer();
                let (ip, port) = neighbor_endpoint();

                peer.add_neighbor(other_peer_id(1), nid(7), ip, port);

                assert_eq!(peer.nid_of(&other_peer_id(1)), Some(nid(7)));
                assert_eq!(peer.id_map().get(&nid(7)), Some(&other_peer_id(1)));
            }

            #[test]
            fn adding_the_same_neighbor_twice_should_keep_the_first_binding() {
                let mut peer = sample_sim_peer();
                let (ip, port) = neighbor_endpoint();

                peer.add_neighbor(other_peer_id(1), nid(7), ip, port);
                peer.add_neighbor(other_peer_id(1), nid(9), ip, port);

                assert_eq!(peer.nid_of(&other_peer_id(1)), Some(nid(7)));
                assert!(!peer.id_map().contains_key(&nid(9)));
            }

            #[test]
            fn a_bound_id_should_not_be_reassigned_to_another_peer() {
                let mut peer = sample_sim_peer();
                let (ip, port) = neighbor_endpoint();

                peer.add_neighbor(other_peer_id(1), nid(7), ip, port);
                peer.add_neighbor(other_peer_id(2), nid(7), ip, port);

                assert_eq!(peer.id_map().get(&nid(7)), Some(&other_peer_id(1)));
                assert_eq!(peer.nid_of(&other_peer_id(2)), None);
            }

            #[test]
            fn a_peer_should_never_become_its_own_neighbor() {
                let mut peer = sample_sim_peer();
                let (ip, port) = neighbor_endpoint();
                let own_id = *peer.peer_id();

                peer.add_neighbor(own_id, nid(0), ip, port);

                assert!(peer.neighbors().is_empty());
            }

            #[test]
            fn removing_a_neighbor_should_release_its_id() {
                let mut peer = sample_sim_peer();
                let (ip, port) = neighbor_endpoint();

                peer.add_neighbor(other_peer_id(1), nid(7), ip, port);
                peer.remove_neighbor(&other_peer_id(1));

                assert_eq!(peer.nid_of(&other_peer_id(1)), None);
                assert!(peer.available_nids().contains(&nid(7)));
            }

            #[test]
            fn removing_a_missing_neighbor_should_be_tolerated() {
                let mut peer = sample_sim_peer();

                peer.remove_neighbor(&other_peer_id(1));

                assert!(peer.neighbors().is_empty());
            }
        }

        mod tracking_available_neighbor_ids {
            use super::{nid, other_peer_id, sample_sim_peer};

            #[test]
            fn a_fresh_peer_should_have_all_255_ids_available() {
                let peer = sample_sim_peer();

                assert_eq!(peer.available_nids().len(), 255);
            }

            #[test]
            fn available_ids_should_be_the_complement_of_the_bound_ones() {
                let mut peer = sample_sim_peer();

                for value in 0..10 {
                    peer.add_neighbor(
                        other_peer_id(value + 1),
                        nid(value),
                        std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                        8081,
                    );
                }

                let available = peer.available_nids();

                assert_eq!(available.len(), 245);
                for value in 0..10 {
                    assert!(!available.contains(&nid(value)));
                }
            }
        }

        mod reporting_failed_neighbors {
            use super::{nid, other_peer_id, sample_sim_peer};

            #[test]
            fn a_failed_neighbor_should_move_to_the_failed_set() {
                let mut peer = sample_sim_peer();
                peer.add_neighbor(
                    other_peer_id(1),
                    nid(3),
                    std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                    8081,
                );

                let moved = peer.mark_failed(nid(3));

                assert_eq!(moved, Some(other_peer_id(1)));
                assert!(peer.failed_neighbors().contains(&other_peer_id(1)));
                assert_eq!(peer.nid_of(&other_peer_id(1)), None);
                assert_eq!(peer.needs_neighbors(), 1);
            }

            #[test]
            fn an_unassigned_id_should_be_ignored() {
                let mut peer = sample_sim_peer();

                let moved = peer.mark_failed(nid(3));

                assert_eq!(moved, None);
                assert_eq!(peer.needs_neighbors(), 0);
            }
        }

        mod tracking_swarm_membership {
            use anomos_tracker_primitives::event::AnnounceEvent;

            use super::sample_sim_peer;
            use crate::graph::sim_peer::MembershipUpdate;
            use crate::test_helpers::tests::sample_info_hash;

            #[test]
            fn an_announce_should_insert_the_membership() {
                let mut peer = sample_sim_peer();

                peer.update(&MembershipUpdate {
                    event: AnnounceEvent::Started,
                    info_hash: sample_info_hash(),
                    downloaded: 0,
                    left: 1000,
                    failed: vec![],
                });

                assert!(peer.is_sharing(&sample_info_hash()));
                assert!(!peer.is_seeding(&sample_info_hash()));
            }

            #[test]
            fn a_peer_with_nothing_left_should_count_as_a_seed() {
                let mut peer = sample_sim_peer();

                peer.update(&MembershipUpdate {
                    event: AnnounceEvent::Completed,
                    info_hash: sample_info_hash(),
                    downloaded: 1000,
                    left: 0,
                    failed: vec![],
                });

                assert!(peer.is_seeding(&sample_info_hash()));
            }

            #[test]
            fn a_stopped_event_should_delete_the_membership() {
                let mut peer = sample_sim_peer();

                peer.update(&MembershipUpdate {
                    event: AnnounceEvent::Started,
                    info_hash: sample_info_hash(),
                    downloaded: 0,
                    left: 1000,
                    failed: vec![],
                });
                peer.update(&MembershipUpdate {
                    event: AnnounceEvent::Stopped,
                    info_hash: sample_info_hash(),
                    downloaded: 0,
                    left: 1000,
                    failed: vec![],
                });

                assert!(!peer.is_sharing(&sample_info_hash()));
            }
        }
    }
}
