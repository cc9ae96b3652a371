//! Process setup: configuration, logging and the periodic jobs.
pub mod app;
pub mod config;
pub mod jobs;
pub mod logging;
