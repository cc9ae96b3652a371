//! The HTTP tracker.
//!
//! The endpoint set:
//!
//! | Path           | Purpose                                              |
//! |----------------|------------------------------------------------------|
//! | `/announce`    | Announce requests; returns neighbors and tracking codes |
//! | `/scrape`      | Per-swarm counters, gated by `scrape_allowed`        |
//! | `/`            | Human-readable info page                             |
//! | `/file`        | Torrent file download, when `allow_get` is enabled   |
//! | `/favicon.ico` | The configured icon                                  |
//!
//! Replies use the tracker's native bencoding. Errors travel as a
//! bencoded dictionary with a single human-readable `failure reason`
//! key, so even a rejected client learns why.
pub mod server;
pub mod v1;
