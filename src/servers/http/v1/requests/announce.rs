//! The `announce` request.
use std::net::IpAddr;

use anomos_tracker_core::crypto::keys::OnionPublicKey;
use anomos_tracker_primitives::event::AnnounceEvent;
use anomos_tracker_primitives::info_hash::InfoHash;
use anomos_tracker_primitives::neighbor_id::NeighborId;
use anomos_tracker_primitives::peer_id::PeerId;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use thiserror::Error;

use crate::servers::http::v1::query::Query;

/// A decoded `announce` request.
#[derive(Debug, Clone)]
pub struct Announce {
    pub info_hash: InfoHash,
    pub peer_id: PeerId,
    pub port: u16,
    pub left: u64,
    pub downloaded: u64,
    pub event: AnnounceEvent,
    pub numwant: Option<u32>,

    /// The self-reported address, honored only per the trust policy.
    pub ip: Option<IpAddr>,

    /// Neighbor ids the peer reports as unreachable.
    pub failed: Vec<NeighborId>,

    /// The peer's public key (URL-safe base64), required on first contact.
    pub public_key: Option<OnionPublicKey>,

    /// Whether to embed a scrape summary in the reply.
    pub include_scrape: bool,
}

impl Announce {
    /// Decodes an announce request from its query string.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first offending parameter; the
    /// caller turns it into a `failure reason` reply.
    pub fn from_query(query: &Query) -> Result<Self, ParseAnnounceError> {
        let info_hash_bytes = query.get("info_hash").ok_or(ParseAnnounceError::MissingInfoHash)?;
        let info_hash =
            InfoHash::try_from(info_hash_bytes).map_err(|_| ParseAnnounceError::InvalidInfoHash {
                len: info_hash_bytes.len(),
            })?;

        let peer_id_bytes = query.get("peer_id").ok_or(ParseAnnounceError::MissingPeerId)?;
        let peer_id = PeerId::try_from(peer_id_bytes).map_err(|_| ParseAnnounceError::InvalidPeerId {
            len: peer_id_bytes.len(),
        })?;

        let port = parse_number::<u16>(query, "port")?.ok_or(ParseAnnounceError::MissingPort)?;
        let left = parse_number::<u64>(query, "left")?.ok_or(ParseAnnounceError::MissingLeft)?;
        let downloaded = parse_number::<u64>(query, "downloaded")?.unwrap_or(0);
        let numwant = parse_number::<u32>(query, "numwant")?;

        let event = match query.get_str("event") {
            None => AnnounceEvent::None,
            Some(value) => value.parse().map_err(|_| ParseAnnounceError::InvalidEvent {
                event: value.to_owned(),
            })?,
        };

        let ip = match query.get_str("ip") {
            None => None,
            Some(value) => Some(value.parse().map_err(|_| ParseAnnounceError::InvalidIp)?),
        };

        let mut failed = Vec::new();
        for value in query.get_all("failed") {
            failed.push(parse_failed_nid(value)?);
        }

        let public_key = match query.get_str("pubkey") {
            None => None,
            Some(value) => {
                let bytes = URL_SAFE_NO_PAD
                    .decode(value)
                    .map_err(|_| ParseAnnounceError::InvalidPublicKey)?;
                Some(OnionPublicKey::try_from(bytes.as_slice()).map_err(|_| ParseAnnounceError::InvalidPublicKey)?)
            }
        };

        Ok(Self {
            info_hash,
            peer_id,
            port,
            left,
            downloaded,
            event,
            numwant,
            ip,
            failed,
            public_key,
            include_scrape: query.has("scrape"),
        })
    }
}

fn parse_number<T: std::str::FromStr>(query: &Query, key: &str) -> Result<Option<T>, ParseAnnounceError> {
    match query.get(key) {
        None => Ok(None),
        Some(raw) => std::str::from_utf8(raw)
            .ok()
            .and_then(|value| value.parse().ok())
            .map(Some)
            .ok_or_else(|| ParseAnnounceError::InvalidNumber { param: key.to_owned() }),
    }
}

/// A failed neighbor id arrives either as a decimal number or as the raw
/// byte itself.
fn parse_failed_nid(value: &[u8]) -> Result<NeighborId, ParseAnnounceError> {
    let byte = match value {
        [byte] if !byte.is_ascii_digit() => *byte,
        _ => std::str::from_utf8(value)
            .ok()
            .and_then(|text| text.parse::<u8>().ok())
            .ok_or(ParseAnnounceError::InvalidFailedNeighbor)?,
    };
    NeighborId::new(byte).map_err(|_| ParseAnnounceError::InvalidFailedNeighbor)
}

/// Errors raised while decoding an announce request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseAnnounceError {
    #[error("missing info_hash param")]
    MissingInfoHash,

    #[error("infohash not of length 20, got {len}")]
    InvalidInfoHash { len: usize },

    #[error("missing peer_id param")]
    MissingPeerId,

    #[error("id not of length 20, got {len}")]
    InvalidPeerId { len: usize },

    #[error("missing port param")]
    MissingPort,

    #[error("missing left param")]
    MissingLeft,

    #[error("invalid or unspecified numeric param: {param}")]
    InvalidNumber { param: String },

    #[error("invalid event")]
    InvalidEvent { event: String },

    #[error("invalid ip param")]
    InvalidIp,

    #[error("invalid failed neighbor id")]
    InvalidFailedNeighbor,

    #[error("invalid pubkey param")]
    InvalidPublicKey,
}
