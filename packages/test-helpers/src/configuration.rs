//! Ephemeral configurations for tests.
//!
//! Every configuration returned here points its state file into a fresh
//! temporary directory and binds to an ephemeral port, so tests can run in
//! parallel without stepping on each other.
use std::path::PathBuf;

use anomos_tracker_configuration::Configuration;

/// An ephemeral configuration with NAT checking disabled.
///
/// Disabling NAT checking makes freshly registered peers immediately
/// eligible as overlay neighbors, which is what almost every test wants.
#[must_use]
pub fn ephemeral() -> Configuration {
    let mut configuration = Configuration::default();

    configuration.http_tracker.port = 0;
    configuration.core.nat_check = 0;
    configuration.core.dfile = ephemeral_state_file();

    configuration
}

/// An ephemeral configuration with NAT checking left at its default, so
/// freshly registered peers stay flagged as NAT'd until probed.
#[must_use]
pub fn ephemeral_with_nat_check() -> Configuration {
    let mut configuration = ephemeral();

    configuration.core.nat_check = 3;

    configuration
}

/// An ephemeral configuration restricted to an allowed directory.
#[must_use]
pub fn ephemeral_listed() -> Configuration {
    let mut configuration = ephemeral();

    configuration.core.allowed_dir = Some(ephemeral_dir());

    configuration
}

/// A state-file path inside a fresh temporary directory.
///
/// # Panics
///
/// Panics if the temporary directory cannot be created.
#[must_use]
pub fn ephemeral_state_file() -> PathBuf {
    ephemeral_dir().join("tracker.dfile")
}

/// A fresh temporary directory that lives until the process exits.
///
/// # Panics
///
/// Panics if the temporary directory cannot be created.
#[must_use]
pub fn ephemeral_dir() -> PathBuf {
    tempfile::TempDir::new()
        .expect("a temporary directory should be available for tests")
        .keep()
}
