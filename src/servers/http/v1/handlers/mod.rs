//! Axum handlers for the tracker endpoints.
//!
//! Every per-peer failure is caught here and turned into a `failure
//! reason` reply; a single malformed or adversarial peer must never
//! degrade service to others.
pub mod announce;
pub mod misc;
pub mod scrape;

use axum::http::HeaderMap;
use std::net::IpAddr;

/// Extracts the right-most `X-Forwarded-For` address, if any.
#[must_use]
pub(crate) fn right_most_forwarded_for(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")?
        .to_str()
        .ok()?
        .split(',')
        .next_back()?
        .trim()
        .parse()
        .ok()
}
