//! Aggregate counters for one swarm.
use serde::{Deserialize, Serialize};

/// The per-swarm counters reported by scrape replies.
///
/// The field names follow the scrape response convention: `complete` and
/// `incomplete` count *active* seeders and leechers, while `downloaded`
/// counts completions ever reported.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SwarmMetadata {
    /// Active peers holding the whole file (seeders).
    pub complete: u32,

    /// Completed downloads ever reported for this swarm.
    pub downloaded: u32,

    /// Active peers still downloading (leechers).
    pub incomplete: u32,
}

impl SwarmMetadata {
    /// All-zero metadata, used for unknown or unauthorized swarms.
    #[must_use]
    pub fn zeroed() -> Self {
        Self::default()
    }
}
