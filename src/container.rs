//! The application dependency containers.
//!
//! Services are wired once at bootstrap and shared behind `Arc`s. The
//! [`AppContainer`] owns everything; the [`HttpContainer`] is the subset
//! the HTTP handlers receive as axum state.
use std::sync::Arc;

use anomos_tracker_configuration::{Core, HttpTracker};
use anomos_tracker_core::announce_handler::AnnounceHandler;
use anomos_tracker_core::graph::repository::InMemoryNetwork;
use anomos_tracker_core::nat::NatChecker;
use anomos_tracker_core::scrape_handler::ScrapeHandler;
use anomos_tracker_core::state::StateRepository;
use anomos_tracker_core::whitelist::authorization::WhitelistAuthorization;
use anomos_tracker_core::whitelist::manager::WhitelistManager;
use anomos_tracker_core::whitelist::repository::InMemoryWhitelist;

/// Everything the application wires together at bootstrap.
pub struct AppContainer {
    pub core_config: Arc<Core>,
    pub http_tracker_config: Arc<HttpTracker>,
    pub network: Arc<InMemoryNetwork>,
    pub announce_handler: Arc<AnnounceHandler>,
    pub scrape_handler: Arc<ScrapeHandler>,
    pub whitelist_authorization: Arc<WhitelistAuthorization>,
    pub in_memory_whitelist: Arc<InMemoryWhitelist>,
    pub whitelist_manager: Arc<WhitelistManager>,
    pub state_repository: Arc<StateRepository>,
    pub nat_checker: Arc<NatChecker>,
}

/// The state handed to the HTTP handlers.
pub struct HttpContainer {
    pub core_config: Arc<Core>,
    pub network: Arc<InMemoryNetwork>,
    pub announce_handler: Arc<AnnounceHandler>,
    pub scrape_handler: Arc<ScrapeHandler>,
    pub whitelist_authorization: Arc<WhitelistAuthorization>,
    pub in_memory_whitelist: Arc<InMemoryWhitelist>,
    pub nat_checker: Arc<NatChecker>,

    /// Icon bytes served for `/favicon.ico`, when configured.
    pub favicon: Option<Vec<u8>>,

    /// The resolved address-override trust policy: whether overrides from
    /// non-local sources must be ignored.
    pub restrict_to_local: bool,
}

impl HttpContainer {
    #[must_use]
    pub fn from_app_container(app_container: &AppContainer) -> Self {
        let favicon = app_container.core_config.favicon.as_ref().and_then(|path| {
            std::fs::read(path)
                .map_err(|e| {
                    tracing::warn!("specified favicon file {} cannot be read: {e}", path.display());
                })
                .ok()
        });

        Self {
            core_config: app_container.core_config.clone(),
            network: app_container.network.clone(),
            announce_handler: app_container.announce_handler.clone(),
            scrape_handler: app_container.scrape_handler.clone(),
            whitelist_authorization: app_container.whitelist_authorization.clone(),
            in_memory_whitelist: app_container.in_memory_whitelist.clone(),
            nat_checker: app_container.nat_checker.clone(),
            favicon,
            restrict_to_local: resolve_override_policy(&app_container.core_config),
        }
    }
}

/// Resolves [`OverrideIpPolicy`](anomos_tracker_configuration::OverrideIpPolicy)
/// against the effective NAT-check setting.
#[must_use]
pub fn resolve_override_policy(config: &Core) -> bool {
    config.only_local_override_ip.restricts_to_local(config.nat_check)
}
