//! Configuration loading for the running process.
use std::path::PathBuf;

use anomos_tracker_configuration::{Configuration, Info};

/// Loads the configuration from the environment and the optional file
/// path given on the command line.
///
/// # Panics
///
/// Panics when the configuration cannot be loaded or parsed; a tracker
/// with half a configuration must not start.
#[must_use]
pub fn initialize_configuration(config_toml_path: Option<PathBuf>) -> Configuration {
    let info = Info::from_env_and_path(config_toml_path);

    match Configuration::load(&info) {
        Ok(configuration) => configuration,
        Err(e) => panic!("configuration error: {e}"),
    }
}
