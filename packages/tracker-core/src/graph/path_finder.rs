//! The level-expansion path search.
//!
//! Tracking codes need simple paths `source → r₁ → … → dest` through
//! existing overlay edges, at least `min_hops` vertices long. The search
//! expands neighbor levels outward from the *destination*, which keeps the
//! fan-out bounded by the destination's locality, until a level meets the
//! source's direct neighbors, then walks back down the levels picking one
//! vertex per level. The first vertex is always an established edge of the
//! source and the final walk step lands in the destination's own
//! neighborhood, so every consecutive pair on the returned path is an edge.
use std::collections::{BTreeMap, BTreeSet};

use anomos_tracker_primitives::info_hash::InfoHash;
use anomos_tracker_primitives::peer_id::PeerId;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::sim_peer::SimPeer;

/// Bounds for one path search.
#[derive(Debug, Clone, Copy)]
pub struct PathSpec {
    /// Stop after this many paths have been collected.
    pub how_many: usize,

    /// Minimum number of vertices on a returned path, source and
    /// destination included.
    pub min_hops: usize,

    /// Hard cap on level expansion per destination.
    pub max_path_len: usize,
}

/// Returns up to `spec.how_many` simple paths from `source` to peers in
/// the swarm of `info_hash`.
///
/// When the source seeds the swarm, only non-seeding downloaders qualify
/// as destinations; otherwise the whole swarm minus the source does.
/// Destinations are tried in swarm-set order; all per-destination choices
/// are uniform over their candidate sets.
pub fn find_paths(
    peers: &BTreeMap<PeerId, SimPeer>,
    rng: &mut StdRng,
    source: &PeerId,
    info_hash: &InfoHash,
    spec: &PathSpec,
) -> Vec<Vec<PeerId>> {
    let Some(source_peer) = peers.get(source) else {
        return Vec::new();
    };

    let source_neighbors = source_peer.neighbor_ids();
    if source_neighbors.is_empty() {
        return Vec::new();
    }

    let destinations: Vec<PeerId> = peers
        .iter()
        .filter(|(peer_id, peer)| {
            if *peer_id == source || !peer.is_sharing(info_hash) {
                return false;
            }
            if source_peer.is_seeding(info_hash) {
                !peer.is_seeding(info_hash)
            } else {
                true
            }
        })
        .map(|(peer_id, _)| *peer_id)
        .collect();

    let mut paths = Vec::new();
    for destination in destinations {
        if paths.len() >= spec.how_many {
            break;
        }
        if let Some(path) = path_to(peers, rng, source, &source_neighbors, &destination, spec) {
            paths.push(path);
        }
    }
    paths
}

/// One backward level-expansion search towards a single destination.
fn path_to(
    peers: &BTreeMap<PeerId, SimPeer>,
    rng: &mut StdRng,
    source: &PeerId,
    source_neighbors: &BTreeSet<PeerId>,
    destination: &PeerId,
    spec: &PathSpec,
) -> Option<Vec<PeerId>> {
    let destination_neighbors = neighbors_of(peers, destination);
    if destination_neighbors.is_empty() {
        return None;
    }

    // levels[0] is the destination's neighborhood, levels[i] the i-th
    // neighbor expansion of it. Vertices may appear at several levels.
    let mut levels: Vec<BTreeSet<PeerId>> = vec![destination_neighbors];
    for _ in 1..spec.min_hops.max(2) - 1 {
        grow(peers, &mut levels);
    }

    // Grow until a level meets the source's neighborhood or the level
    // count hits the cap.
    let mut meeting: BTreeSet<PeerId> = intersection(source_neighbors, levels.last()?);
    while meeting.is_empty() && levels.len() < spec.max_path_len {
        grow(peers, &mut levels);
        meeting = intersection(source_neighbors, levels.last()?);
    }

    meeting.remove(destination);
    if meeting.is_empty() {
        return None;
    }

    let candidates: Vec<PeerId> = meeting.into_iter().collect();
    let first = *candidates.choose(rng)?;

    let mut path = vec![first];
    let mut excluded: BTreeSet<PeerId> = BTreeSet::from([*source, *destination, first]);

    for level in levels[..levels.len() - 1].iter().rev() {
        let tail = *path.last()?;
        let tail_neighbors = neighbors_of(peers, &tail);

        let step_candidates: Vec<PeerId> = tail_neighbors
            .intersection(level)
            .filter(|&peer_id| !excluded.contains(peer_id))
            .copied()
            .collect();

        let Some(next) = step_candidates.choose(rng).copied() else {
            // Dead end. Acceptable only when the walk already reached the
            // destination's neighborhood; otherwise this destination is
            // blocked by cycles.
            if tail_neighbors.contains(destination) {
                break;
            }
            return None;
        };

        path.push(next);
        excluded.insert(next);
    }

    path.push(*destination);
    path.insert(0, *source);

    if path.len() < spec.min_hops {
        return None;
    }
    Some(path)
}

fn grow(peers: &BTreeMap<PeerId, SimPeer>, levels: &mut Vec<BTreeSet<PeerId>>) {
    let last = levels.last().expect("levels start non-empty");
    let next: BTreeSet<PeerId> = last
        .iter()
        .flat_map(|peer_id| neighbors_of(peers, peer_id))
        .collect();
    levels.push(next);
}

fn neighbors_of(peers: &BTreeMap<PeerId, SimPeer>, peer_id: &PeerId) -> BTreeSet<PeerId> {
    peers.get(peer_id).map(SimPeer::neighbor_ids).unwrap_or_default()
}

fn intersection(a: &BTreeSet<PeerId>, b: &BTreeSet<PeerId>) -> BTreeSet<PeerId> {
    a.intersection(b).copied().collect()
}
