//! Setup for the main tracker application.
//!
//! The [`setup`] function only builds the application and its
//! dependencies; it does not start anything. Starting the jobs is
//! [`app::start`](crate::app::start)'s job.
//!
//! Setup steps:
//!
//! 1. Load the application configuration.
//! 2. Initialize logging.
//! 3. Wire the domain services into the [`AppContainer`].
use std::path::PathBuf;
use std::sync::Arc;

use anomos_tracker_configuration::Configuration;
use anomos_tracker_core::announce_handler::AnnounceHandler;
use anomos_tracker_core::graph::repository::InMemoryNetwork;
use anomos_tracker_core::nat::NatChecker;
use anomos_tracker_core::scrape_handler::ScrapeHandler;
use anomos_tracker_core::state::StateRepository;
use anomos_tracker_core::whitelist::authorization::WhitelistAuthorization;
use anomos_tracker_core::whitelist::manager::WhitelistManager;
use anomos_tracker_core::whitelist::repository::InMemoryWhitelist;

use super::config::initialize_configuration;
use crate::bootstrap;
use crate::container::AppContainer;

/// It loads the configuration and builds the app container.
///
/// # Panics
///
/// Setup fails the process when the configuration is missing or invalid;
/// there is nothing sensible to serve without it.
#[must_use]
pub fn setup(config_toml_path: Option<PathBuf>) -> (Configuration, AppContainer) {
    let configuration = initialize_configuration(config_toml_path);

    if let Err(e) = configuration.validate() {
        panic!("configuration error: {e}");
    }

    bootstrap::logging::setup(&configuration);

    let app_container = initialize_app_container(&configuration);

    (configuration, app_container)
}

/// Wires the domain services together.
#[must_use]
pub fn initialize_app_container(configuration: &Configuration) -> AppContainer {
    let core_config = Arc::new(configuration.core.clone());
    let http_tracker_config = Arc::new(configuration.http_tracker.clone());

    let network = Arc::new(InMemoryNetwork::default());
    let in_memory_whitelist = Arc::new(InMemoryWhitelist::default());
    let whitelist_authorization = Arc::new(WhitelistAuthorization::new(&configuration.core, &in_memory_whitelist));
    let whitelist_manager = Arc::new(WhitelistManager::new(
        configuration.core.allowed_dir.as_deref(),
        &in_memory_whitelist,
    ));
    let state_repository = Arc::new(StateRepository::new(&configuration.core.dfile));
    let nat_checker = Arc::new(NatChecker::new(&configuration.core, &network));

    let announce_handler = Arc::new(AnnounceHandler::new(&configuration.core, &network));
    let scrape_handler = Arc::new(ScrapeHandler::new(
        &whitelist_authorization,
        &in_memory_whitelist,
        &network,
    ));

    AppContainer {
        core_config,
        http_tracker_config,
        network,
        announce_handler,
        scrape_handler,
        whitelist_authorization,
        in_memory_whitelist,
        whitelist_manager,
        state_repository,
        nat_checker,
    }
}
