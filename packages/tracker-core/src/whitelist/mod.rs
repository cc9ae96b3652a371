//! The allowed-torrents whitelist.
//!
//! When the tracker is configured with an `allowed_dir`, only torrents
//! found in that directory are served: announces and scrapes for anything
//! else are refused, and the `/file` endpoint (when enabled) serves the
//! torrent files themselves.
//!
//! The pieces:
//!
//! - [`repository::InMemoryWhitelist`]: the in-memory allowed set, mapping
//!   info hashes to the torrent's name and on-disk path.
//! - [`authorization::WhitelistAuthorization`]: the yes/no service the
//!   handlers consult.
//! - [`manager::WhitelistManager`]: fills the set by scanning the allowed
//!   directory, and rescans it periodically.
pub mod authorization;
pub mod manager;
pub mod repository;
