//! The idle-peer sweeper job.
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use anomos_tracker_clock::clock::Time;
use anomos_tracker_configuration::Core;
use tokio::task::JoinHandle;

use crate::container::AppContainer;
use crate::CurrentClock;

/// Spawns the job that periodically expires peers that have gone quiet.
///
/// A peer that has not announced for `timeout_downloaders_interval`
/// seconds is removed from the overlay, all its edges with it. Unless
/// `keep_dead` is set, counters of swarms that ended up empty are dropped
/// too, except those on the allowed list, which keep showing up in
/// scrapes whether they have peers or not.
pub fn start_job(config: &Core, app_container: &Arc<AppContainer>) -> JoinHandle<()> {
    let interval = Duration::from_secs(u64::from(config.timeout_downloaders_interval));
    let keep_dead = config.keep_dead;
    let network = app_container.network.clone();
    let in_memory_whitelist = app_container.in_memory_whitelist.clone();

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await; // the first tick fires immediately

        loop {
            ticker.tick().await;

            let cutoff = CurrentClock::now_sub(&interval).unwrap_or_default();
            let retain: BTreeSet<_> = in_memory_whitelist.all().await.into_keys().collect();

            let expired = network.expire_idle_peers(cutoff, keep_dead, &retain);
            if !expired.is_empty() {
                tracing::info!("expired {} idle peers", expired.len());
            }
        }
    })
}
