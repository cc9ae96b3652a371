//! Whitelist authorization.
use std::panic::Location;
use std::sync::Arc;

use anomos_tracker_configuration::Core;
use anomos_tracker_primitives::info_hash::InfoHash;

use super::repository::InMemoryWhitelist;
use crate::error::WhitelistError;

/// Manages the authorization of torrents based on the allowed list.
///
/// Used to determine whether a given torrent (`infohash`) may be announced
/// or scraped on this tracker.
pub struct WhitelistAuthorization {
    /// Whether an allowed directory is in force.
    listed: bool,

    /// The in-memory list of allowed torrents.
    in_memory_whitelist: Arc<InMemoryWhitelist>,
}

impl WhitelistAuthorization {
    /// Creates a new authorization service.
    pub fn new(config: &Core, in_memory_whitelist: &Arc<InMemoryWhitelist>) -> Self {
        Self {
            listed: config.allowed_dir.is_some(),
            in_memory_whitelist: in_memory_whitelist.clone(),
        }
    }

    /// Checks whether a torrent is authorized.
    ///
    /// - Without an allowed directory, all torrents are authorized.
    /// - With one, only torrents in the allowed list are.
    ///
    /// # Errors
    ///
    /// Returns `WhitelistError::TorrentNotAllowed` when an allowed
    /// directory is in force and the `info_hash` is not in the list.
    pub async fn authorize(&self, info_hash: &InfoHash) -> Result<(), WhitelistError> {
        if !self.is_listed() {
            return Ok(());
        }

        if self.in_memory_whitelist.contains(info_hash).await {
            return Ok(());
        }

        Err(WhitelistError::TorrentNotAllowed {
            info_hash: *info_hash,
            location: Location::caller(),
        })
    }

    /// Whether the tracker is restricted to an allowed directory.
    #[must_use]
    pub fn is_listed(&self) -> bool {
        self.listed
    }
}
