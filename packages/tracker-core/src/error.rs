//! Core tracker errors.
//!
//! This module defines the error types used internally by the anonymizing
//! tracker core. There is one enum per §-of-concern: announce validation,
//! overlay wiring, onion construction, whitelisting and state persistence.
//! Every per-peer error is recoverable: the announce boundary turns it into
//! a `failure reason` reply and keeps serving other peers.
use std::panic::Location;

use anomos_tracker_primitives::info_hash::InfoHash;
use anomos_tracker_primitives::peer_id::PeerId;
use thiserror::Error;

/// Errors raised while validating or applying an announce request.
///
/// None of these mutate tracker state: a rejected announce leaves the
/// overlay exactly as it was.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnnounceError {
    /// The port is outside `1..=65534`.
    #[error("invalid port: {port}")]
    InvalidPort { port: u16 },

    /// A first-contact announce arrived without the peer's public key, so
    /// no overlay identity can be created for it.
    #[error("unknown peer {peer_id} announced without a public key")]
    MissingPublicKey { peer_id: PeerId },
}

/// Errors related to wiring the overlay graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectError {
    /// The two peers have no neighbor id left in common. The failure is
    /// local to this edge; nothing was mutated on either side.
    #[error("no neighbor id available between {a} and {b}")]
    NoAvailableNid { a: PeerId, b: PeerId },

    /// One of the endpoints is not registered in the graph.
    #[error("peer {peer_id} is not in the graph")]
    PeerNotFound { peer_id: PeerId },

    /// A peer cannot be its own neighbor.
    #[error("peer {peer_id} cannot connect to itself")]
    SelfLoop { peer_id: PeerId },
}

/// Errors raised while building a tracking code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OnionError {
    /// The layered ciphertext outgrew the fixed message length; callers
    /// retry with a shorter path.
    #[error("onion of {len} bytes exceeds the fixed message length {msg_len}")]
    OnionTooLong { len: usize, msg_len: usize },

    /// The forwarding chain was empty.
    #[error("cannot build an onion over an empty path")]
    EmptyPath,

    /// An intermediate hop is missing the neighbor id of its successor,
    /// which means the path does not follow overlay edges.
    #[error("hop {index} has no neighbor id for its successor")]
    MissingNeighborId { index: usize },
}

/// Errors related to torrent whitelisting.
///
/// This error is returned when an operation involves a torrent that is not
/// in the allowed set while an allowed directory is in force.
#[derive(Error, Debug, Clone)]
pub enum WhitelistError {
    /// Indicates that the torrent identified by `info_hash` is not allowed.
    #[error("the torrent: {info_hash}, is not allowed on this tracker, {location}")]
    TorrentNotAllowed {
        info_hash: InfoHash,
        location: &'static Location<'static>,
    },
}

/// Errors related to the persisted state file.
#[derive(Error, Debug)]
pub enum StateError {
    /// The state file could not be read or written.
    #[error("unable to access the state file: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// The state file did not contain a valid bencoded snapshot. Loading
    /// resets to an empty state instead of failing the tracker.
    #[error("state file is corrupt: {message}")]
    Corrupt { message: String },
}
