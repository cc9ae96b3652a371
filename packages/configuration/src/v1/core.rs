//! Domain-level tracker settings.
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The `[core]` section: everything the tracker domain logic reads.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct Core {
    /// Seconds clients should wait between regular reannounces.
    pub reannounce_interval: u32,

    /// Default number of neighbors to describe in a reply when the client
    /// does not send `numwant`.
    pub response_size: u32,

    /// Hard cap on the number of neighbors described in a single reply.
    pub max_give: u32,

    /// How many times to probe whether a peer is reachable from the outside
    /// before giving up. `0` disables NAT checking entirely, which also
    /// means freshly registered peers are immediately eligible as overlay
    /// neighbors.
    pub nat_check: u8,

    /// Seconds a single NAT probe may take before it counts as failed.
    pub socket_timeout: u32,

    /// Seconds of silence after which a peer is expired from the overlay.
    pub timeout_downloaders_interval: u32,

    /// Seconds between saves of the state file.
    pub save_dfile_interval: u32,

    /// Path of the bencoded state file.
    pub dfile: PathBuf,

    /// When set, only torrents found in this directory are served, and the
    /// directory is rescanned periodically.
    pub allowed_dir: Option<PathBuf>,

    /// Seconds between rescans of `allowed_dir`.
    pub parse_dir_interval: u32,

    /// Keep counters for swarms that no longer have peers.
    pub keep_dead: bool,

    /// Which scrape requests are answered.
    pub scrape_allowed: ScrapePolicy,

    /// Trust policy for client-supplied addresses (the `ip` parameter and
    /// forwarded-for headers).
    pub only_local_override_ip: OverrideIpPolicy,

    /// Hard cap on path-finder level expansion.
    pub max_path_len: usize,

    /// Directory holding the tracker's cryptographic material.
    pub data_dir: PathBuf,

    /// How many overlay neighbors to wire up for a freshly registered peer.
    pub num_neighbors: usize,

    /// The fixed length in bytes of every tracking code.
    pub msg_len: usize,

    /// Serve torrent files over `/file?info_hash=…`. Requires
    /// `allowed_dir`.
    pub allow_get: bool,

    /// Expose torrent names (from the allowed dir) in scrape replies.
    pub show_names: bool,

    /// File with x-icon data returned for `/favicon.ico`.
    pub favicon: Option<PathBuf>,
}

impl Default for Core {
    fn default() -> Self {
        Self {
            reannounce_interval: 1800,
            response_size: 50,
            max_give: 200,
            nat_check: 3,
            socket_timeout: 15,
            timeout_downloaders_interval: 2700,
            save_dfile_interval: 300,
            dfile: PathBuf::from("./tracker.dfile"),
            allowed_dir: None,
            parse_dir_interval: 60,
            keep_dead: false,
            scrape_allowed: ScrapePolicy::Full,
            only_local_override_ip: OverrideIpPolicy::UnlessNatCheck,
            max_path_len: 20,
            data_dir: PathBuf::from("."),
            num_neighbors: 4,
            msg_len: 4096,
            allow_get: false,
            show_names: true,
            favicon: None,
        }
    }
}

/// Which scrape requests the tracker answers.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScrapePolicy {
    /// No scrape access at all.
    None,

    /// Only scrapes naming specific info hashes.
    Specific,

    /// Full scrapes of every tracked swarm.
    Full,
}

impl ScrapePolicy {
    /// Whether scrapes naming specific info hashes are answered.
    #[must_use]
    pub fn allows_specific(&self) -> bool {
        matches!(self, Self::Specific | Self::Full)
    }

    /// Whether full scrapes are answered.
    #[must_use]
    pub fn allows_full(&self) -> bool {
        matches!(self, Self::Full)
    }
}

/// Trust policy for client-supplied addresses.
///
/// The numeric values are the historical configuration values: `0` never
/// ignores overrides, `1` always ignores overrides from non-local sources,
/// and `2` ignores them only when NAT checking is disabled.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(try_from = "u8", into = "u8")]
pub enum OverrideIpPolicy {
    Never,
    Always,
    UnlessNatCheck,
}

impl OverrideIpPolicy {
    /// Whether address overrides from non-local sources must be ignored,
    /// given the effective NAT-check setting.
    #[must_use]
    pub fn restricts_to_local(&self, nat_check: u8) -> bool {
        match self {
            Self::Never => false,
            Self::Always => true,
            Self::UnlessNatCheck => nat_check == 0,
        }
    }
}

impl TryFrom<u8> for OverrideIpPolicy {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Never),
            1 => Ok(Self::Always),
            2 => Ok(Self::UnlessNatCheck),
            other => Err(format!("only_local_override_ip must be 0, 1 or 2, got {other}")),
        }
    }
}

impl From<OverrideIpPolicy> for u8 {
    fn from(policy: OverrideIpPolicy) -> Self {
        match policy {
            OverrideIpPolicy::Never => 0,
            OverrideIpPolicy::Always => 1,
            OverrideIpPolicy::UnlessNatCheck => 2,
        }
    }
}
