//! The identifier a client chooses for itself: 20 opaque bytes.
use std::fmt;
use std::str::FromStr;

use serde::de::Visitor;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// The length in bytes of a peer id.
pub const PEER_ID_BYTES_LEN: usize = 20;

/// 20-byte per-peer identifier chosen by the client.
///
/// Unlike an [`InfoHash`](crate::info_hash::InfoHash), peer ids are usually
/// printable (clients embed their name and version), but the tracker treats
/// them as opaque bytes. The canonical textual form used in logs and the
/// state file is 40 lowercase hex characters.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(pub [u8; PEER_ID_BYTES_LEN]);

impl PeerId {
    /// Returns the raw bytes of the peer id.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; PEER_ID_BYTES_LEN] {
        &self.0
    }

    /// Returns the peer id as a 40-character lowercase hex string.
    #[must_use]
    pub fn to_hex_string(&self) -> String {
        let mut buffer = [0u8; PEER_ID_BYTES_LEN * 2];
        let encoded = binascii::bin2hex(&self.0, &mut buffer).expect("output buffer has the exact size");
        std::str::from_utf8(encoded)
            .expect("hex digits are valid UTF-8")
            .to_owned()
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex_string())
    }
}

impl fmt::Debug for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeerId({})", self.to_hex_string())
    }
}

impl From<[u8; PEER_ID_BYTES_LEN]> for PeerId {
    fn from(bytes: [u8; PEER_ID_BYTES_LEN]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for PeerId {
    type Error = InvalidPeerIdError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; PEER_ID_BYTES_LEN] = bytes
            .try_into()
            .map_err(|_| InvalidPeerIdError::InvalidLength { len: bytes.len() })?;
        Ok(Self(bytes))
    }
}

impl FromStr for PeerId {
    type Err = InvalidPeerIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != PEER_ID_BYTES_LEN * 2 {
            return Err(InvalidPeerIdError::InvalidHexLength { len: s.len() });
        }
        let mut bytes = [0u8; PEER_ID_BYTES_LEN];
        binascii::hex2bin(s.as_bytes(), &mut bytes).map_err(|_| InvalidPeerIdError::InvalidHexChars)?;
        Ok(Self(bytes))
    }
}

/// Errors raised when converting raw bytes or hex strings into a [`PeerId`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidPeerIdError {
    #[error("invalid peer id length: {len}, expected {PEER_ID_BYTES_LEN}")]
    InvalidLength { len: usize },

    #[error("invalid peer id hex length: {len}, expected {}", PEER_ID_BYTES_LEN * 2)]
    InvalidHexLength { len: usize },

    #[error("peer id contains non-hex characters")]
    InvalidHexChars,
}

impl Serialize for PeerId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex_string())
    }
}

impl<'de> Deserialize<'de> for PeerId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_str(PeerIdVisitor)
    }
}

struct PeerIdVisitor;

impl Visitor<'_> for PeerIdVisitor {
    type Value = PeerId;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "a 40-character hex string")
    }

    fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
        v.parse()
            .map_err(|_| E::invalid_value(serde::de::Unexpected::Str(v), &"a 40-character hex string"))
    }

    // Bencoded sources hand strings over as raw bytes.
    fn visit_bytes<E: serde::de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
        let s = std::str::from_utf8(v)
            .map_err(|_| E::invalid_value(serde::de::Unexpected::Bytes(v), &"a 40-character hex string"))?;
        self.visit_str(s)
    }
}
