//! Bencoded responses for the announce and scrape endpoints.
pub mod announce;
pub mod error;
pub mod scrape;
