//! The onion builder: turning a path into a tracking code.
//!
//! A tracking code is one fixed-length byte string. Each member of the
//! forwarding chain peels one layer with its private key and finds either
//! a *relay* instruction (the one-byte neighbor id of the next hop plus
//! the remaining ciphertext) or, at the destination, the tagged payload.
//! The layer plaintexts are:
//!
//! ```text
//! intermediate:  0x00 ‖ session_id(hop) ‖ nid(hop → next) ‖ inner ciphertext
//! destination:   0x01 ‖ session_id(dest) ‖ payload
//! ```
//!
//! The leading tag byte tells the recipient whether to relay or keep the
//! message; the embedded session id lets it check the message belongs to
//! its current tracker session. After all layers are applied the blob is
//! padded with random bytes to exactly the configured message length, so a
//! relay cannot tell how deep in the chain it sits. The padding travels
//! outside the encryption: when a hop peels its layer, the tail of what it
//! forwards is keystream-garbled padding, and each recipient that knows
//! its plaintext's length simply ignores the ride-along tail.
//!
//! Construction runs inside-out as a plain loop over the chain in reverse,
//! accumulating ciphertext in a local buffer.
use anomos_tracker_primitives::neighbor_id::NeighborId;
use anomos_tracker_primitives::session_id::{SessionId, SESSION_ID_BYTES_LEN};
use rand::{CryptoRng, RngCore};
use thiserror::Error;

use crate::crypto::keys::{OnionKeyPair, OnionPublicKey, UnwrapError};
use crate::crypto::random_padding;
use crate::error::OnionError;

/// Tag byte of an intermediate layer: relay to the neighbor that follows.
pub const RELAY_TAG: u8 = 0x00;

/// Tag byte of the innermost layer: the payload is for this hop.
pub const DELIVERY_TAG: u8 = 0x01;

/// What the onion builder needs to know about one member of the chain.
///
/// Copied out of the graph so no lock is held while the public-key work
/// runs.
#[derive(Clone)]
pub struct HopInfo {
    pub public_key: OnionPublicKey,
    pub session_id: SessionId,

    /// The id of the edge to the next chain member, `None` at the
    /// destination.
    pub next_nid: Option<NeighborId>,
}

/// Builds the onion for a forwarding chain.
///
/// `hops` lists every peer that will peel a layer, in forwarding order;
/// the last entry is the destination. Every entry before it must carry the
/// neighbor id of its successor.
///
/// # Errors
///
/// Fails when the chain is empty, an intermediate hop is missing its
/// successor's neighbor id, or the layered ciphertext outgrows `msg_len`
/// (callers retry with a shorter path).
pub fn build_tracking_code<R: RngCore + CryptoRng>(
    hops: &[HopInfo],
    payload: &[u8],
    msg_len: usize,
    rng: &mut R,
) -> Result<Vec<u8>, OnionError> {
    let (destination, relays) = hops.split_last().ok_or(OnionError::EmptyPath)?;

    let mut plaintext = Vec::with_capacity(1 + SESSION_ID_BYTES_LEN + payload.len());
    plaintext.push(DELIVERY_TAG);
    plaintext.extend_from_slice(destination.session_id.as_bytes());
    plaintext.extend_from_slice(payload);

    let mut message = destination.public_key.wrap(&plaintext, rng);

    for (index, hop) in relays.iter().enumerate().rev() {
        let nid = hop.next_nid.ok_or(OnionError::MissingNeighborId { index })?;

        let mut plaintext = Vec::with_capacity(1 + SESSION_ID_BYTES_LEN + 1 + message.len());
        plaintext.push(RELAY_TAG);
        plaintext.extend_from_slice(hop.session_id.as_bytes());
        plaintext.push(nid.value());
        plaintext.extend_from_slice(&message);

        message = hop.public_key.wrap(&plaintext, rng);
    }

    if message.len() > msg_len {
        return Err(OnionError::OnionTooLong {
            len: message.len(),
            msg_len,
        });
    }

    let padding = random_padding(msg_len - message.len(), rng);
    message.extend_from_slice(&padding);
    Ok(message)
}

/// One peeled onion layer, as seen by a chain member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeeledLayer {
    /// Relay the rest to the neighbor named by `next_hop`.
    Relay {
        session_id: SessionId,
        next_hop: NeighborId,
        rest: Vec<u8>,
    },

    /// The payload is for this peer. When the blob was padded, the payload
    /// carries the garbled padding tail; recipients know their payload
    /// length.
    Delivery { session_id: SessionId, payload: Vec<u8> },
}

/// Peels one layer with the recipient's key pair.
///
/// This is the client half of the protocol; the tracker only builds. It
/// lives here so the two sides of the format stay in one place, and so
/// tests can unwrap what the builder produced.
///
/// # Errors
///
/// Fails when the blob or its plaintext is too short, the tag byte is
/// unknown, or a relay layer names the reserved neighbor byte.
pub fn peel(key_pair: &OnionKeyPair, blob: &[u8]) -> Result<PeeledLayer, PeelError> {
    let plaintext = key_pair.unwrap(blob)?;

    let (&tag, after_tag) = plaintext.split_first().ok_or(PeelError::TooShort { len: plaintext.len() })?;
    if after_tag.len() < SESSION_ID_BYTES_LEN {
        return Err(PeelError::TooShort { len: plaintext.len() });
    }
    let (session_bytes, after_session) = after_tag.split_at(SESSION_ID_BYTES_LEN);
    let session_id = SessionId::try_from(session_bytes).expect("slice has the exact size");

    match tag {
        DELIVERY_TAG => Ok(PeeledLayer::Delivery {
            session_id,
            payload: after_session.to_vec(),
        }),
        RELAY_TAG => {
            let (&nid_byte, rest) = after_session
                .split_first()
                .ok_or(PeelError::TooShort { len: plaintext.len() })?;
            let next_hop = NeighborId::new(nid_byte).map_err(|_| PeelError::ReservedNeighborId)?;
            Ok(PeeledLayer::Relay {
                session_id,
                next_hop,
                rest: rest.to_vec(),
            })
        }
        other => Err(PeelError::UnknownTag { tag: other }),
    }
}

/// Errors raised while peeling a layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PeelError {
    #[error(transparent)]
    Unwrap(#[from] UnwrapError),

    #[error("layer plaintext of {len} bytes is too short")]
    TooShort { len: usize },

    #[error("unknown layer tag: {tag:#04x}")]
    UnknownTag { tag: u8 },

    #[error("relay layer names the reserved neighbor byte")]
    ReservedNeighborId,
}
