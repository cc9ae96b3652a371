//! Scrape handler.
//!
//! The `scrape` request lets clients query swarm counters in bulk without
//! announcing. The anonymizing overlay is not involved: scrape data is the
//! same aggregate view a classic tracker serves.
//!
//! For each requested info hash the reply carries:
//!
//! ```text
//! {
//!     'complete':   active seeders,
//!     'incomplete': active leechers,
//!     'downloaded': completions ever reported,
//! }
//! ```
//!
//! A torrent outside the allowed list (when an allowed directory is in
//! force) scrapes as all zeroes rather than leaking whether the tracker
//! has seen it.
use std::collections::BTreeMap;
use std::sync::Arc;

use anomos_tracker_primitives::info_hash::InfoHash;
use anomos_tracker_primitives::swarm_metadata::SwarmMetadata;

use crate::graph::repository::InMemoryNetwork;
use crate::whitelist;
use crate::whitelist::repository::InMemoryWhitelist;

/// The data for a `scrape` response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeData {
    /// The counters per requested info hash.
    pub files: BTreeMap<InfoHash, SwarmMetadata>,
}

impl ScrapeData {
    /// Creates an empty `ScrapeData` with no files.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Adds a torrent to the `ScrapeData`.
    pub fn add_file(&mut self, info_hash: &InfoHash, swarm_metadata: SwarmMetadata) {
        self.files.insert(*info_hash, swarm_metadata);
    }

    /// Adds a torrent with zeroed metadata.
    pub fn add_file_with_zeroed_metadata(&mut self, info_hash: &InfoHash) {
        self.files.insert(*info_hash, SwarmMetadata::zeroed());
    }
}

/// Handles scrape requests, providing per-swarm counters.
pub struct ScrapeHandler {
    /// Service for authorizing access to allowed torrents.
    whitelist_authorization: Arc<whitelist::authorization::WhitelistAuthorization>,

    /// The in-memory list of allowed torrents, for full scrapes.
    in_memory_whitelist: Arc<InMemoryWhitelist>,

    /// The in-memory overlay graph.
    network: Arc<InMemoryNetwork>,
}

impl ScrapeHandler {
    #[must_use]
    pub fn new(
        whitelist_authorization: &Arc<whitelist::authorization::WhitelistAuthorization>,
        in_memory_whitelist: &Arc<InMemoryWhitelist>,
        network: &Arc<InMemoryNetwork>,
    ) -> Self {
        Self {
            whitelist_authorization: whitelist_authorization.clone(),
            in_memory_whitelist: in_memory_whitelist.clone(),
            network: network.clone(),
        }
    }

    /// Handles a scrape request for multiple torrents.
    ///
    /// - Returns counters for each requested torrent.
    /// - A torrent that is not allowed (or unknown) reports zeroed
    ///   counters.
    pub async fn scrape(&self, info_hashes: &Vec<InfoHash>) -> ScrapeData {
        let mut scrape_data = ScrapeData::empty();

        for info_hash in info_hashes {
            let swarm_metadata = match self.whitelist_authorization.authorize(info_hash).await {
                Ok(()) => self.network.swarm_metadata(info_hash),
                Err(_) => SwarmMetadata::zeroed(),
            };
            scrape_data.add_file(info_hash, swarm_metadata);
        }

        scrape_data
    }

    /// Handles a full scrape: every allowed torrent when an allowed list
    /// is in force, otherwise every swarm the tracker currently tracks.
    pub async fn scrape_all(&self) -> ScrapeData {
        let info_hashes: Vec<InfoHash> = if self.whitelist_authorization.is_listed() {
            self.in_memory_whitelist.all().await.keys().copied().collect()
        } else {
            self.network.tracked_swarms().into_iter().collect()
        };

        self.scrape(&info_hashes).await
    }
}
