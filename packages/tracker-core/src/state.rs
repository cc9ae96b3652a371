//! The persisted tracker state.
//!
//! A single bencoded file survives restarts. It holds the per-swarm peer
//! records, the completed-download counters and the allowed list:
//!
//! ```text
//! {
//!     "peers":     {infohash: {peer_id: {"ip": …, "port": …, "left": …}}},
//!     "completed": {infohash: count},
//!     "allowed":   {infohash: name},
//! }
//! ```
//!
//! The file is written atomically (write-then-rename) from a consistent
//! snapshot every save interval. A corrupt or unreadable file resets to an
//! empty state with a warning rather than failing the tracker.
//!
//! Only counters and the allowed list are *restored* on load. Peer records
//! are written for operator visibility, but a peer's session id and key
//! die with the process, so the overlay refills as peers re-announce.
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anomos_tracker_primitives::info_hash::InfoHash;
use anomos_tracker_primitives::peer_id::PeerId;
use serde::{Deserialize, Serialize};

use crate::error::StateError;

/// One peer's record inside a swarm entry of the state file.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PeerRecord {
    pub ip: String,
    pub port: u16,
    pub left: u64,
}

/// Everything the state file holds.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct StateSnapshot {
    #[serde(default)]
    pub peers: BTreeMap<InfoHash, BTreeMap<PeerId, PeerRecord>>,

    #[serde(default)]
    pub completed: BTreeMap<InfoHash, u32>,

    #[serde(default)]
    pub allowed: BTreeMap<InfoHash, String>,
}

/// Reads and writes the bencoded state file.
pub struct StateRepository {
    path: PathBuf,
}

impl StateRepository {
    #[must_use]
    pub fn new(path: &Path) -> Self {
        Self { path: path.to_path_buf() }
    }

    /// Loads the last saved snapshot.
    ///
    /// A missing file is a normal first start and yields an empty
    /// snapshot; a corrupt file is logged and *also* yields an empty
    /// snapshot, so a damaged disk never keeps the tracker down.
    #[must_use]
    pub fn load(&self) -> StateSnapshot {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return StateSnapshot::default();
            }
            Err(e) => {
                tracing::warn!("unable to read state file {}: {e}; resetting", self.path.display());
                return StateSnapshot::default();
            }
        };

        match serde_bencode::from_bytes(&bytes) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("state file {} is corrupt: {e}; resetting", self.path.display());
                StateSnapshot::default()
            }
        }
    }

    /// Writes a snapshot atomically.
    ///
    /// # Errors
    ///
    /// Returns an error when the snapshot cannot be encoded or the file
    /// cannot be written; callers log and keep serving.
    pub fn save(&self, snapshot: &StateSnapshot) -> Result<(), StateError> {
        let bytes = serde_bencode::to_bytes(snapshot).map_err(|e| StateError::Corrupt { message: e.to_string() })?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, &bytes)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {

    mod the_state_repository {
        use std::collections::BTreeMap;

        use anomos_tracker_test_helpers::configuration::ephemeral_state_file;

        use crate::state::{PeerRecord, StateRepository, StateSnapshot};
        use crate::test_helpers::tests::{sample_info_hash, sample_peer_id};

        fn sample_snapshot() -> StateSnapshot {
            let mut members = BTreeMap::new();
            members.insert(
                sample_peer_id(),
                PeerRecord {
                    ip: "126.0.0.1".to_owned(),
                    port: 8080,
                    left: 512,
                },
            );

            let mut peers = BTreeMap::new();
            peers.insert(sample_info_hash(), members);

            let mut completed = BTreeMap::new();
            completed.insert(sample_info_hash(), 7);

            let mut allowed = BTreeMap::new();
            allowed.insert(sample_info_hash(), "debian.iso".to_owned());

            StateSnapshot {
                peers,
                completed,
                allowed,
            }
        }

        #[test]
        fn it_should_round_trip_a_snapshot_through_disk() {
            let repository = StateRepository::new(&ephemeral_state_file());

            repository.save(&sample_snapshot()).unwrap();

            assert_eq!(repository.load(), sample_snapshot());
        }

        #[test]
        fn a_missing_file_should_load_as_an_empty_snapshot() {
            let repository = StateRepository::new(&ephemeral_state_file());

            assert_eq!(repository.load(), StateSnapshot::default());
        }

        #[test]
        fn a_corrupt_file_should_reset_to_an_empty_snapshot() {
            let path = ephemeral_state_file();
            std::fs::write(&path, b"this is not bencode").unwrap();

            let repository = StateRepository::new(&path);

            assert_eq!(repository.load(), StateSnapshot::default());
        }

        #[test]
        fn saving_should_replace_the_previous_snapshot() {
            let repository = StateRepository::new(&ephemeral_state_file());

            repository.save(&sample_snapshot()).unwrap();
            repository.save(&StateSnapshot::default()).unwrap();

            assert_eq!(repository.load(), StateSnapshot::default());
        }
    }
}
