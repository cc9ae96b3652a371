//! The per-registration session identifier embedded in onion layers.
use std::fmt;

use rand::{CryptoRng, Rng};
use thiserror::Error;

/// The length in bytes of a session id.
pub const SESSION_ID_BYTES_LEN: usize = 8;

/// 8 random bytes issued by the tracker when a peer registers.
///
/// The session id is constant for the peer's lifetime in the tracker and is
/// embedded in every onion layer addressed to the peer, so a hop can
/// recognize that a peeled message really is for its current session.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId([u8; SESSION_ID_BYTES_LEN]);

impl SessionId {
    /// Draws a fresh session id from the given RNG.
    pub fn generate<R: Rng + CryptoRng>(rng: &mut R) -> Self {
        let mut bytes = [0u8; SESSION_ID_BYTES_LEN];
        rng.fill(&mut bytes);
        Self(bytes)
    }

    /// Returns the raw bytes of the session id.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; SESSION_ID_BYTES_LEN] {
        &self.0
    }
}

impl From<[u8; SESSION_ID_BYTES_LEN]> for SessionId {
    fn from(bytes: [u8; SESSION_ID_BYTES_LEN]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for SessionId {
    type Error = InvalidSessionIdError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; SESSION_ID_BYTES_LEN] = bytes
            .try_into()
            .map_err(|_| InvalidSessionIdError::InvalidLength { len: bytes.len() })?;
        Ok(Self(bytes))
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buffer = [0u8; SESSION_ID_BYTES_LEN * 2];
        let encoded = binascii::bin2hex(&self.0, &mut buffer).expect("output buffer has the exact size");
        write!(f, "SessionId({})", std::str::from_utf8(encoded).expect("hex digits are valid UTF-8"))
    }
}

/// Error raised when raw bytes cannot be used as a session id.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidSessionIdError {
    #[error("invalid session id length: {len}, expected {SESSION_ID_BYTES_LEN}")]
    InvalidLength { len: usize },
}
