//! The Anomos tracker application.
//!
//! This crate is the delivery layer around
//! [`anomos-tracker-core`](anomos_tracker_core): it loads configuration,
//! sets up logging, wires the domain services together and serves the HTTP
//! endpoints (`/announce`, `/scrape`, the info page, `/file` and the
//! favicon).
//!
//! ```text
//!   Delivery layer  |   Domain layer
//! -----------------------------------
//!     HTTP tracker  |-> Core tracker
//! ```
//!
//! The binary's lifecycle: [`bootstrap::app::setup`] builds the
//! [`container::AppContainer`], [`app::start`] spawns the jobs (the HTTP
//! server plus the periodic maintenance tasks), and a `ctrl-c` tears
//! everything down after one final state save.
pub mod app;
pub mod bootstrap;
pub mod container;
pub mod servers;

use anomos_tracker_clock::clock;

/// This code needs to be copied into each crate.
/// Working version, for production.
#[cfg(not(test))]
#[allow(dead_code)]
pub(crate) type CurrentClock = clock::Working;

/// Stopped version, for testing.
#[cfg(test)]
#[allow(dead_code)]
pub(crate) type CurrentClock = clock::Stopped;
