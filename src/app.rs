//! The tracker application.
//!
//! There is no main application process: starting the application means
//! starting a bunch of independent jobs and waiting. The jobs are:
//!
//! - The HTTP tracker (always).
//! - The idle-peer sweeper, expiring peers that stopped announcing.
//! - The state saver, snapshotting the tracker state to the bencoded
//!   state file.
//! - The allowed-directory rescanner, when an allowed directory is
//!   configured.
//!
//! Before any job starts, the persisted state is restored (counters and
//! the allowed list) and the allowed directory gets its first scan.
use std::sync::Arc;

use anomos_tracker_configuration::Configuration;
use tokio::task::JoinHandle;

use crate::bootstrap::jobs::{http_tracker, peer_cleanup, state_saver, whitelist_rescan};
use crate::container::{AppContainer, HttpContainer};

/// Restores persisted state and spawns all jobs.
pub async fn start(config: &Configuration, app_container: &Arc<AppContainer>) -> Vec<JoinHandle<()>> {
    // Restore counters and the allowed list from the last run.
    let snapshot = app_container.state_repository.load();
    app_container.network.import_state(&snapshot);
    app_container.whitelist_manager.seed_from_state(&snapshot.allowed).await;

    // First scan of the allowed directory, before serving anything.
    if config.core.allowed_dir.is_some() {
        match app_container.whitelist_manager.rescan().await {
            Ok(count) => tracing::info!("allowed directory scanned: {count} torrents"),
            Err(e) => tracing::warn!("allowed directory scan failed: {e}"),
        }
    }

    let mut jobs: Vec<JoinHandle<()>> = Vec::new();

    let http_container = Arc::new(HttpContainer::from_app_container(app_container));
    jobs.push(http_tracker::start_job(&config.http_tracker, http_container));

    jobs.push(peer_cleanup::start_job(&config.core, app_container));

    jobs.push(state_saver::start_job(&config.core, app_container));

    if config.core.allowed_dir.is_some() {
        jobs.push(whitelist_rescan::start_job(&config.core, app_container));
    }

    jobs
}

/// Writes one final state snapshot, used during shutdown.
pub async fn save_state_once(app_container: &Arc<AppContainer>) {
    let allowed = app_container
        .in_memory_whitelist
        .all()
        .await
        .into_iter()
        .map(|(info_hash, entry)| (info_hash, entry.name))
        .collect();

    let snapshot = app_container.network.state_snapshot(allowed);

    if let Err(e) = app_container.state_repository.save(&snapshot) {
        tracing::warn!("unable to save the state file: {e}");
    }
}
