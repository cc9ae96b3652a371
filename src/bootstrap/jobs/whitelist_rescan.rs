//! The allowed-directory rescanner job.
use std::sync::Arc;
use std::time::Duration;

use anomos_tracker_configuration::Core;
use tokio::task::JoinHandle;

use crate::container::AppContainer;

/// Spawns the job that periodically rescans the allowed directory, so
/// torrents dropped into it start being served without a restart.
pub fn start_job(config: &Core, app_container: &Arc<AppContainer>) -> JoinHandle<()> {
    let interval = Duration::from_secs(u64::from(config.parse_dir_interval));
    let whitelist_manager = app_container.whitelist_manager.clone();

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await; // the first tick fires immediately

        loop {
            ticker.tick().await;

            match whitelist_manager.rescan().await {
                Ok(count) => tracing::debug!("allowed directory rescanned: {count} torrents"),
                Err(e) => tracing::warn!("allowed directory rescan failed: {e}"),
            }
        }
    })
}
