//! The delivery servers.
pub mod http;
