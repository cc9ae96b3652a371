//! Primitive types shared by the Anomos tracker packages.
//!
//! The tracker coordinates an anonymizing overlay on top of ordinary
//! `BitTorrent` swarms. The identifiers it deals in are:
//!
//! - [`InfoHash`](info_hash::InfoHash): the 20-byte identifier of a swarm.
//! - [`PeerId`](peer_id::PeerId): the 20-byte identifier a client picks for
//!   itself.
//! - [`NeighborId`](neighbor_id::NeighborId): the one-byte relative
//!   identifier naming one overlay edge incident to a peer. Both endpoints
//!   of an edge share the same `NeighborId`, so after the handshake peers
//!   address each other only through these short relative ids.
//! - [`SessionId`](session_id::SessionId): 8 random bytes issued by the
//!   tracker when a peer registers, embedded in every onion layer addressed
//!   to that peer.
use std::time::Duration;

pub mod event;
pub mod info_hash;
pub mod neighbor_id;
pub mod peer_id;
pub mod session_id;
pub mod swarm_metadata;

/// Duration since the Unix epoch, used for peer timestamps.
pub type DurationSinceUnixEpoch = Duration;
