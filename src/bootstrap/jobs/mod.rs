//! The application's long-running jobs.
//!
//! Each submodule exposes one `start_job` function returning the spawned
//! task's handle. Jobs never kill the tracker: failures inside a tick are
//! logged and the next tick runs anyway.
pub mod http_tracker;
pub mod peer_cleanup;
pub mod state_saver;
pub mod whitelist_rescan;
