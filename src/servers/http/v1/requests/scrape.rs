//! The `scrape` request.
use anomos_tracker_primitives::info_hash::InfoHash;
use thiserror::Error;

use crate::servers::http::v1::query::Query;

/// A decoded `scrape` request.
#[derive(Debug, Clone, Default)]
pub struct Scrape {
    /// The requested swarms. Empty means a full scrape.
    pub info_hashes: Vec<InfoHash>,
}

impl Scrape {
    /// Decodes a scrape request from its query string.
    ///
    /// # Errors
    ///
    /// Returns an error when an `info_hash` value is not 20 bytes.
    pub fn from_query(query: &Query) -> Result<Self, ParseScrapeError> {
        let mut info_hashes = Vec::new();
        for raw in query.get_all("info_hash") {
            info_hashes.push(InfoHash::try_from(raw).map_err(|_| ParseScrapeError::InvalidInfoHash { len: raw.len() })?);
        }
        Ok(Self { info_hashes })
    }
}

/// Errors raised while decoding a scrape request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseScrapeError {
    #[error("infohash not of length 20, got {len}")]
    InvalidInfoHash { len: usize },
}
