//! Logging setup.
//!
//! One global `tracing` subscriber, configured from the `[logging]`
//! section. Reinitializing (as tests spawning the app may do) is a no-op.
use std::sync::Once;

use anomos_tracker_configuration::Configuration;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Installs the global tracing subscriber with the configured threshold.
pub fn setup(config: &Configuration) {
    let threshold = config.logging.threshold;

    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(threshold.to_string()))
            .init();

        tracing::info!("logging initialized at threshold {threshold}");
    });
}
