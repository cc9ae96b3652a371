//! The state-saver job.
use std::sync::Arc;
use std::time::Duration;

use anomos_tracker_configuration::Core;
use tokio::task::JoinHandle;

use crate::container::AppContainer;

/// Spawns the job that periodically snapshots the tracker state into the
/// bencoded state file.
///
/// The snapshot is taken under the graph's read lock, so it is internally
/// consistent; the write itself happens outside any lock. A failed write
/// is logged and retried on the next tick.
pub fn start_job(config: &Core, app_container: &Arc<AppContainer>) -> JoinHandle<()> {
    let interval = Duration::from_secs(u64::from(config.save_dfile_interval));
    let network = app_container.network.clone();
    let in_memory_whitelist = app_container.in_memory_whitelist.clone();
    let state_repository = app_container.state_repository.clone();

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await; // the first tick fires immediately

        loop {
            ticker.tick().await;

            let allowed = in_memory_whitelist
                .all()
                .await
                .into_iter()
                .map(|(info_hash, entry)| (info_hash, entry.name))
                .collect();

            let snapshot = network.state_snapshot(allowed);

            if let Err(e) = state_repository.save(&snapshot) {
                tracing::warn!("unable to save the state file: {e}");
            } else {
                tracing::debug!("state file saved");
            }
        }
    })
}
