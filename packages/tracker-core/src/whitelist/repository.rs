//! The in-memory list of allowed torrents.
use std::collections::BTreeMap;
use std::path::PathBuf;

use anomos_tracker_primitives::info_hash::InfoHash;

/// What the tracker knows about one allowed torrent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedTorrent {
    /// The torrent name, from the metainfo `info.name` field.
    pub name: String,

    /// Where the `.torrent` file lives, when it came from a directory
    /// scan. Entries restored from the state file have no path until the
    /// next rescan.
    pub path: Option<PathBuf>,
}

/// In-memory whitelist to manage allowed torrents.
///
/// Stores the allowed entries for quick lookup and modification.
#[derive(Debug, Default)]
pub struct InMemoryWhitelist {
    /// A thread-safe map of allowed torrents.
    whitelist: tokio::sync::RwLock<BTreeMap<InfoHash, AllowedTorrent>>,
}

impl InMemoryWhitelist {
    /// Adds a torrent to the in-memory whitelist.
    ///
    /// # Returns
    ///
    /// - `true` if the torrent was newly added.
    /// - `false` if the torrent was already in the whitelist.
    pub async fn add(&self, info_hash: &InfoHash, entry: AllowedTorrent) -> bool {
        self.whitelist.write().await.insert(*info_hash, entry).is_none()
    }

    /// Removes a torrent from the in-memory whitelist.
    pub async fn remove(&self, info_hash: &InfoHash) -> bool {
        self.whitelist.write().await.remove(info_hash).is_some()
    }

    /// Checks if a torrent is in the whitelist.
    pub async fn contains(&self, info_hash: &InfoHash) -> bool {
        self.whitelist.read().await.contains_key(info_hash)
    }

    /// Returns one allowed entry.
    pub async fn get(&self, info_hash: &InfoHash) -> Option<AllowedTorrent> {
        self.whitelist.read().await.get(info_hash).cloned()
    }

    /// Returns the whole allowed set.
    pub async fn all(&self) -> BTreeMap<InfoHash, AllowedTorrent> {
        self.whitelist.read().await.clone()
    }

    /// Replaces the whole allowed set, as a directory rescan does.
    pub async fn replace_all(&self, entries: BTreeMap<InfoHash, AllowedTorrent>) {
        *self.whitelist.write().await = entries;
    }

    /// Clears all torrents from the whitelist.
    pub async fn clear(&self) {
        self.whitelist.write().await.clear();
    }
}

#[cfg(test)]
mod tests {

    use crate::test_helpers::tests::sample_info_hash;
    use crate::whitelist::repository::{AllowedTorrent, InMemoryWhitelist};

    fn sample_entry() -> AllowedTorrent {
        AllowedTorrent {
            name: "debian.iso".to_owned(),
            path: None,
        }
    }

    #[tokio::test]
    async fn should_allow_adding_a_new_torrent_to_the_whitelist() {
        let whitelist = InMemoryWhitelist::default();

        whitelist.add(&sample_info_hash(), sample_entry()).await;

        assert!(whitelist.contains(&sample_info_hash()).await);
    }

    #[tokio::test]
    async fn should_allow_removing_a_torrent_from_the_whitelist() {
        let whitelist = InMemoryWhitelist::default();

        whitelist.add(&sample_info_hash(), sample_entry()).await;
        whitelist.remove(&sample_info_hash()).await;

        assert!(!whitelist.contains(&sample_info_hash()).await);
    }

    #[tokio::test]
    async fn should_allow_replacing_the_whole_set() {
        let whitelist = InMemoryWhitelist::default();

        whitelist.add(&sample_info_hash(), sample_entry()).await;
        whitelist.replace_all(std::collections::BTreeMap::new()).await;

        assert!(!whitelist.contains(&sample_info_hash()).await);
    }

    #[tokio::test]
    async fn should_return_the_stored_entry() {
        let whitelist = InMemoryWhitelist::default();

        whitelist.add(&sample_info_hash(), sample_entry()).await;

        assert_eq!(whitelist.get(&sample_info_hash()).await, Some(sample_entry()));
    }
}
