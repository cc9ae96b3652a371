//! Version `1` of the Anomos tracker configuration data structures.
//!
//! Each TOML section maps to one structure: `[core]` to [`core::Core`],
//! `[http_tracker]` to [`http_tracker::HttpTracker`] and `[logging]` to
//! [`logging::Logging`].
pub mod core;
pub mod http_tracker;
pub mod logging;

use serde::{Deserialize, Serialize};

use self::core::Core;
use self::http_tracker::HttpTracker;
use self::logging::Logging;

/// The whole tracker configuration.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct Configuration {
    /// Logging configuration.
    pub logging: Logging,

    /// The domain-level tracker settings.
    pub core: Core,

    /// The HTTP announce endpoint settings.
    pub http_tracker: HttpTracker,
}
