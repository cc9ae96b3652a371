//! The `announce` response.
//!
//! The bencoded reply dictionary:
//!
//! - `interval`: seconds between reannounces.
//! - `peers`: the announcing peer's overlay neighbors as `{ip, port,
//!   peer_id}`. The `peer_id` value is the *single-byte neighbor id*,
//!   not a full peer id, because neighbors address each other by relative
//!   id after the handshake.
//! - `tracking codes`: a list of `[key‖iv, onion]` pairs.
//! - `scrape` (optional): a per-swarm counter summary.
use anomos_tracker_core::announce_handler::AnnounceData;
use serde::Serialize;
use serde_bytes::ByteBuf;

/// The bencodable announce reply.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Announce {
    pub interval: u32,

    pub peers: Vec<Peer>,

    #[serde(rename = "tracking codes")]
    pub tracking_codes: Vec<(ByteBuf, ByteBuf)>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub scrape: Option<ScrapeEntry>,
}

/// One neighbor entry of the reply.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    pub ip: String,
    pub port: u16,

    /// The one-byte neighbor id, as a one-byte string.
    pub peer_id: ByteBuf,
}

/// The optional embedded scrape summary.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ScrapeEntry {
    pub complete: u32,
    pub incomplete: u32,
    pub downloaded: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Announce {
    /// Builds the reply from the handler's data.
    #[must_use]
    pub fn from_data(announce_data: &AnnounceData, scrape: Option<ScrapeEntry>) -> Self {
        let peers = announce_data
            .peers
            .iter()
            .map(|entry| Peer {
                ip: entry.ip.to_string(),
                port: entry.port,
                peer_id: ByteBuf::from(vec![entry.nid.value()]),
            })
            .collect();

        let tracking_codes = announce_data
            .tracking_codes
            .iter()
            .map(|tracking_code| {
                (
                    ByteBuf::from(tracking_code.key_iv.clone()),
                    ByteBuf::from(tracking_code.code.clone()),
                )
            })
            .collect();

        Self {
            interval: announce_data.interval,
            peers,
            tracking_codes,
            scrape,
        }
    }

    /// The bencoded reply body.
    ///
    /// # Panics
    ///
    /// Panics if the reply cannot be bencoded, which would be a bug in the
    /// response types rather than a runtime condition.
    #[must_use]
    pub fn body(&self) -> Vec<u8> {
        serde_bencode::to_bytes(self).expect("the announce response must bencode")
    }
}
