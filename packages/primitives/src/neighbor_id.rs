//! The one-byte relative identifier naming an overlay edge.
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The number of neighbor ids a single peer can hand out: `0..=254`.
///
/// The 256th byte value is reserved so it can never collide with the onion
/// tag bytes that travel in the same position of a peeled layer.
pub const MAX_NEIGHBORS: usize = 255;

/// A single byte uniquely naming one edge incident to a peer.
///
/// Both endpoints of an edge share the same `NeighborId`; the id names the
/// edge, not a direction. Valid values are `0..=254`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct NeighborId(u8);

impl NeighborId {
    /// The highest byte value a neighbor id can take.
    pub const MAX: u8 = 254;

    /// Creates a neighbor id, rejecting the reserved byte value 255.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is the reserved byte.
    pub fn new(value: u8) -> Result<Self, InvalidNeighborIdError> {
        if value > Self::MAX {
            return Err(InvalidNeighborIdError::Reserved { value });
        }
        Ok(Self(value))
    }

    /// Returns the raw byte value.
    #[must_use]
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for NeighborId {
    type Error = InvalidNeighborIdError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NeighborId> for u8 {
    fn from(nid: NeighborId) -> Self {
        nid.0
    }
}

impl fmt::Display for NeighborId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for NeighborId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NeighborId({})", self.0)
    }
}

/// Error raised when a byte cannot be used as a neighbor id.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidNeighborIdError {
    #[error("byte value {value} is reserved and cannot name an edge")]
    Reserved { value: u8 },
}
