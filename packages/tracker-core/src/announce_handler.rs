//! Announce handler.
//!
//! Handling `announce` requests is the most important task for the
//! tracker, and the only place the overlay graph changes shape.
//!
//! An announce tells the tracker that a peer holds or wants a file. On a
//! classic tracker the reply would be a list of swarm members; here the
//! peer instead gets (a) its current *overlay neighbors*, addressed by
//! one-byte relative ids rather than peer ids, and (b) a batch of
//! **tracking codes**, each an onion-encrypted route to an anonymous swarm
//! member.
//!
//! One announce flows through these steps:
//!
//! 1. Validation. A malformed request is rejected before anything mutates.
//! 2. Registration or update. A first contact must carry the peer's public
//!    key; the tracker issues a session id and wires the newcomer to up to
//!    `num_neighbors` random reachable peers. A `stopped` event tears the
//!    peer down instead, cascading to all incident edges.
//! 3. Failure handling. Edges the peer reported as unreachable are
//!    dropped on both sides and replacements are wired in, never
//!    re-selecting a peer that failed before.
//! 4. Reply assembly: the neighbor list, the swarm counters, and, for a
//!    downloading peer, up to [`TRACKING_CODES_PER_ANNOUNCE`] tracking
//!    codes, each paired with fresh symmetric key material for the
//!    transfer it sets up.
use std::net::IpAddr;
use std::sync::Arc;

use anomos_tracker_configuration::{Core, MIN_TRACKING_HOPS, TRACKING_CODES_PER_ANNOUNCE};
use anomos_tracker_primitives::event::AnnounceEvent;
use anomos_tracker_primitives::info_hash::InfoHash;
use anomos_tracker_primitives::neighbor_id::NeighborId;
use anomos_tracker_primitives::peer_id::PeerId;
use anomos_tracker_primitives::swarm_metadata::SwarmMetadata;
use rand::seq::SliceRandom;
use rand::thread_rng;

use crate::crypto::keys::OnionPublicKey;
use crate::crypto::transfer::TransferKey;
use crate::error::AnnounceError;
use crate::graph::path_finder::PathSpec;
use crate::graph::repository::{InMemoryNetwork, NeighborListEntry};
use crate::graph::sim_peer::MembershipUpdate;
use crate::onion::build_tracking_code;

/// How many paths one search collects; the excess beyond
/// [`TRACKING_CODES_PER_ANNOUNCE`] is shuffled away so the selection stays
/// uniform.
const PATHS_PER_SEARCH: usize = 5;

/// An announce request, already decoded by the delivery layer.
#[derive(Debug, Clone)]
pub struct AnnounceRequest {
    pub peer_id: PeerId,
    pub info_hash: InfoHash,

    /// The port the peer listens on.
    pub port: u16,

    pub downloaded: u64,
    pub left: u64,
    pub event: AnnounceEvent,

    /// How many neighbors the client wants described.
    pub numwant: Option<u32>,

    /// Neighbor ids the peer reports as unreachable.
    pub failed: Vec<NeighborId>,

    /// The peer's public key; required on first contact, ignored after.
    pub public_key: Option<OnionPublicKey>,
}

/// One tracking code plus the symmetric key material that goes with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingCode {
    /// `key ‖ iv` for the transfer the code sets up.
    pub key_iv: Vec<u8>,

    /// The fixed-length onion.
    pub code: Vec<u8>,
}

/// Everything an announce reply is built from.
#[derive(Debug, Clone)]
pub struct AnnounceData {
    /// The peer's overlay neighbors. The id in each entry is the one-byte
    /// relative id, which is how neighbors address each other after the
    /// handshake.
    pub peers: Vec<NeighborListEntry>,

    pub tracking_codes: Vec<TrackingCode>,
    pub stats: SwarmMetadata,

    /// Seconds the client should wait before reannouncing.
    pub interval: u32,
}

/// Handles `announce` requests.
pub struct AnnounceHandler {
    /// The tracker configuration.
    config: Core,

    /// The in-memory overlay graph.
    network: Arc<InMemoryNetwork>,
}

impl AnnounceHandler {
    #[must_use]
    pub fn new(config: &Core, network: &Arc<InMemoryNetwork>) -> Self {
        Self {
            config: config.clone(),
            network: network.clone(),
        }
    }

    /// Processes an announce request from a peer.
    ///
    /// `peer_ip` is the peer's resolved address: trackers ignore
    /// self-reported addresses unless the configured trust policy says
    /// otherwise, and resolving that is the delivery layer's job.
    ///
    /// # Errors
    ///
    /// Returns a recoverable error for invalid requests; tracker state is
    /// untouched in that case.
    pub fn announce(&self, request: &AnnounceRequest, peer_ip: &IpAddr) -> Result<AnnounceData, AnnounceError> {
        Self::validate(request)?;

        if request.event == AnnounceEvent::Stopped {
            self.network.disconnect(&request.peer_id);
            return Ok(AnnounceData {
                peers: Vec::new(),
                tracking_codes: Vec::new(),
                stats: self.network.swarm_metadata(&request.info_hash),
                interval: self.config.reannounce_interval,
            });
        }

        if !self.network.contains(&request.peer_id) {
            let public_key = request.public_key.ok_or(AnnounceError::MissingPublicKey {
                peer_id: request.peer_id,
            })?;
            self.network.register_peer(
                request.peer_id,
                public_key,
                *peer_ip,
                request.port,
                self.config.num_neighbors,
                self.config.nat_check == 0,
            );
        }

        self.network.update_membership(
            &request.peer_id,
            &MembershipUpdate {
                event: request.event,
                info_hash: request.info_hash,
                downloaded: request.downloaded,
                left: request.left,
                failed: request.failed.clone(),
            },
        );

        let offered = self.network.offer_replacements(&request.peer_id);
        if offered > 0 {
            tracing::debug!("wired {offered} replacement neighbors for {}", request.peer_id);
        }

        let peers = self.network.neighbor_list(&request.peer_id, self.peers_wanted(request.numwant));

        let tracking_codes = if request.left > 0 {
            self.tracking_codes_for(&request.peer_id, &request.info_hash)
        } else {
            Vec::new()
        };

        Ok(AnnounceData {
            peers,
            tracking_codes,
            stats: self.network.swarm_metadata(&request.info_hash),
            interval: self.config.reannounce_interval,
        })
    }

    fn validate(request: &AnnounceRequest) -> Result<(), AnnounceError> {
        if request.port == 0 || request.port == u16::MAX {
            return Err(AnnounceError::InvalidPort { port: request.port });
        }
        Ok(())
    }

    /// The neighbor-list cap: the client's `numwant` bounded by
    /// `max_give`, or `response_size` when the client did not say.
    fn peers_wanted(&self, numwant: Option<u32>) -> usize {
        let wanted = match numwant {
            Some(numwant) if numwant > 0 => numwant,
            _ => self.config.response_size,
        };
        wanted.min(self.config.max_give) as usize
    }

    /// Builds up to [`TRACKING_CODES_PER_ANNOUNCE`] tracking codes from
    /// `source` into the swarm.
    ///
    /// The graph search runs under the lock; the per-layer public-key work
    /// runs out here on the copied-out chains. A path whose onion outgrows
    /// the fixed message length is dropped with a log line; the remaining
    /// codes still ship.
    fn tracking_codes_for(&self, source: &PeerId, info_hash: &InfoHash) -> Vec<TrackingCode> {
        let spec = PathSpec {
            how_many: PATHS_PER_SEARCH,
            min_hops: MIN_TRACKING_HOPS,
            max_path_len: self.config.max_path_len,
        };

        let mut chains = self.network.path_hops(source, info_hash, &spec);

        let mut rng = thread_rng();
        if chains.len() > TRACKING_CODES_PER_ANNOUNCE {
            chains.shuffle(&mut rng);
            chains.truncate(TRACKING_CODES_PER_ANNOUNCE);
        }

        let mut codes = Vec::with_capacity(chains.len());
        for chain in &chains {
            let transfer_key = TransferKey::generate(&mut rng);

            let key_iv = transfer_key.to_bytes();
            let mut payload = Vec::with_capacity(info_hash.as_bytes().len() + key_iv.len());
            payload.extend_from_slice(info_hash.as_bytes());
            payload.extend_from_slice(&key_iv);

            match build_tracking_code(chain, &payload, self.config.msg_len, &mut rng) {
                Ok(code) => codes.push(TrackingCode { key_iv, code }),
                Err(e) => {
                    tracing::warn!("dropping tracking code for {info_hash}: {e}");
                }
            }
        }
        codes
    }
}

#[cfg(test)]
mod tests {

    mod the_announce_handler {
        use std::net::{IpAddr, Ipv4Addr};
        use std::sync::Arc;

        use anomos_tracker_primitives::event::AnnounceEvent;
        use anomos_tracker_primitives::peer_id::PeerId;
        use anomos_tracker_test_helpers::configuration;

        use crate::announce_handler::{AnnounceHandler, AnnounceRequest};
        use crate::graph::repository::InMemoryNetwork;
        use crate::test_helpers::tests::{sample_info_hash, sample_key_pair};

        pub fn initialize_handler() -> (Arc<AnnounceHandler>, Arc<InMemoryNetwork>) {
            let config = configuration::ephemeral();
            let network = Arc::new(InMemoryNetwork::with_seed(7));
            let handler = Arc::new(AnnounceHandler::new(&config.core, &network));
            (handler, network)
        }

        pub fn numeric_peer_id(value: u8) -> PeerId {
            let mut bytes = [0u8; 20];
            bytes[19] = value;
            PeerId::from(bytes)
        }

        pub fn peer_ip(value: u8) -> IpAddr {
            IpAddr::V4(Ipv4Addr::new(126, 0, 0, value))
        }

        pub fn first_announce(value: u8, left: u64) -> AnnounceRequest {
            AnnounceRequest {
                peer_id: numeric_peer_id(value),
                info_hash: sample_info_hash(),
                port: 8000 + u16::from(value),
                downloaded: 0,
                left,
                event: AnnounceEvent::Started,
                numwant: None,
                failed: vec![],
                public_key: Some(*sample_key_pair(value.into()).public()),
            }
        }

        mod validating_requests {
            use super::{first_announce, initialize_handler, peer_ip};
            use crate::error::AnnounceError;

            #[test]
            fn it_should_reject_port_zero_without_touching_the_graph() {
                let (handler, network) = initialize_handler();

                let mut request = first_announce(1, 100);
                request.port = 0;

                let result = handler.announce(&request, &peer_ip(1));

                assert_eq!(result.unwrap_err(), AnnounceError::InvalidPort { port: 0 });
                assert!(!network.contains(&request.peer_id));
            }

            #[test]
            fn it_should_reject_the_highest_port_value() {
                let (handler, _network) = initialize_handler();

                let mut request = first_announce(1, 100);
                request.port = u16::MAX;

                assert!(handler.announce(&request, &peer_ip(1)).is_err());
            }

            #[test]
            fn a_first_contact_without_a_public_key_should_be_rejected() {
                let (handler, network) = initialize_handler();

                let mut request = first_announce(1, 100);
                request.public_key = None;

                let result = handler.announce(&request, &peer_ip(1));

                assert!(matches!(result.unwrap_err(), AnnounceError::MissingPublicKey { .. }));
                assert!(!network.contains(&request.peer_id));
            }
        }

        mod handling_a_first_announce {
            use super::{first_announce, initialize_handler, peer_ip};

            #[test]
            fn the_first_peer_should_get_an_empty_neighbor_list() {
                let (handler, _network) = initialize_handler();

                let announce_data = handler.announce(&first_announce(1, 100), &peer_ip(1)).unwrap();

                assert!(announce_data.peers.is_empty());
                assert_eq!(announce_data.stats.incomplete, 1);
            }

            #[test]
            fn a_later_peer_should_be_wired_to_the_earlier_ones() {
                let (handler, _network) = initialize_handler();

                handler.announce(&first_announce(1, 100), &peer_ip(1)).unwrap();
                let announce_data = handler.announce(&first_announce(2, 100), &peer_ip(2)).unwrap();

                assert_eq!(announce_data.peers.len(), 1);
            }

            #[test]
            fn the_reply_should_carry_the_configured_interval() {
                let (handler, _network) = initialize_handler();

                let announce_data = handler.announce(&first_announce(1, 100), &peer_ip(1)).unwrap();

                assert_eq!(announce_data.interval, 1800);
            }
        }

        mod updating_swarm_stats {
            use anomos_tracker_primitives::event::AnnounceEvent;

            use super::{first_announce, initialize_handler, peer_ip};

            #[test]
            fn a_seeder_should_count_as_complete() {
                let (handler, _network) = initialize_handler();

                let announce_data = handler.announce(&first_announce(1, 0), &peer_ip(1)).unwrap();

                assert_eq!(announce_data.stats.complete, 1);
                assert_eq!(announce_data.stats.incomplete, 0);
            }

            #[test]
            fn a_completed_event_should_bump_the_downloaded_counter() {
                let (handler, _network) = initialize_handler();

                handler.announce(&first_announce(1, 100), &peer_ip(1)).unwrap();

                let mut request = first_announce(1, 0);
                request.event = AnnounceEvent::Completed;
                let announce_data = handler.announce(&request, &peer_ip(1)).unwrap();

                assert_eq!(announce_data.stats.downloaded, 1);
                assert_eq!(announce_data.stats.complete, 1);
            }

            #[test]
            fn reannouncing_after_completion_should_not_double_count() {
                let (handler, _network) = initialize_handler();

                handler.announce(&first_announce(1, 100), &peer_ip(1)).unwrap();

                let mut request = first_announce(1, 0);
                request.event = AnnounceEvent::Completed;
                handler.announce(&request, &peer_ip(1)).unwrap();
                let announce_data = handler.announce(&request, &peer_ip(1)).unwrap();

                assert_eq!(announce_data.stats.downloaded, 1);
            }
        }

        mod handling_a_stopped_event {
            use anomos_tracker_primitives::event::AnnounceEvent;

            use super::{first_announce, initialize_handler, numeric_peer_id, peer_ip};

            #[test]
            fn the_peer_should_disappear_from_the_swarm_and_the_graph() {
                let (handler, network) = initialize_handler();

                handler.announce(&first_announce(1, 100), &peer_ip(1)).unwrap();
                handler.announce(&first_announce(2, 100), &peer_ip(2)).unwrap();

                let mut request = first_announce(1, 100);
                request.event = AnnounceEvent::Stopped;
                let announce_data = handler.announce(&request, &peer_ip(1)).unwrap();

                assert!(announce_data.peers.is_empty());
                assert!(announce_data.tracking_codes.is_empty());
                assert!(!network.contains(&numeric_peer_id(1)));
                assert_eq!(announce_data.stats.incomplete, 1);

                // Nobody still references the stopped peer.
                assert!(network.neighbor_list(&numeric_peer_id(2), 50).is_empty());
            }
        }

        mod reporting_failed_neighbors {
            use super::{first_announce, initialize_handler, numeric_peer_id, peer_ip};

            #[test]
            fn a_failed_neighbor_should_be_dropped_and_never_reselected() {
                let (handler, network) = initialize_handler();

                handler.announce(&first_announce(1, 100), &peer_ip(1)).unwrap();
                let announce_data = handler.announce(&first_announce(2, 100), &peer_ip(2)).unwrap();
                let failed_nid = announce_data.peers[0].nid;

                let mut request = first_announce(2, 100);
                request.failed = vec![failed_nid];
                let announce_data = handler.announce(&request, &peer_ip(2)).unwrap();

                // The only replacement candidate is the peer that just
                // failed, so the list must stay empty.
                assert!(announce_data.peers.is_empty());

                // And the edge is gone on both sides.
                assert!(network.neighbor_list(&numeric_peer_id(1), 50).is_empty());
            }
        }

        mod handing_out_tracking_codes {
            use anomos_tracker_configuration::TRACKING_CODES_PER_ANNOUNCE;

            use super::{first_announce, initialize_handler, peer_ip};

            #[test]
            fn a_seeder_should_get_no_tracking_codes() {
                let (handler, _network) = initialize_handler();

                for value in 1..=6 {
                    handler.announce(&first_announce(value, 100), &peer_ip(value)).unwrap();
                }

                let announce_data = handler.announce(&first_announce(7, 0), &peer_ip(7)).unwrap();

                assert!(announce_data.tracking_codes.is_empty());
            }

            #[test]
            fn a_downloader_in_a_wired_swarm_should_get_codes_of_the_fixed_length() {
                let (handler, _network) = initialize_handler();

                // A well-connected swarm of ten peers.
                for value in 1..=10 {
                    handler.announce(&first_announce(value, 100), &peer_ip(value)).unwrap();
                }

                // Reannounce so path search sees the latest membership.
                let announce_data = handler.announce(&first_announce(5, 100), &peer_ip(5)).unwrap();

                assert!(
                    !announce_data.tracking_codes.is_empty(),
                    "a ten-peer swarm should offer at least one path"
                );
                assert!(announce_data.tracking_codes.len() <= TRACKING_CODES_PER_ANNOUNCE);
                for tracking_code in &announce_data.tracking_codes {
                    assert_eq!(tracking_code.code.len(), 4096);
                    assert_eq!(tracking_code.key_iv.len(), 48);
                }
            }

            #[test]
            fn an_empty_swarm_should_yield_no_codes() {
                let (handler, _network) = initialize_handler();

                let announce_data = handler.announce(&first_announce(1, 100), &peer_ip(1)).unwrap();

                assert!(announce_data.tracking_codes.is_empty());
            }
        }
    }
}
