//! Axum handler for the `scrape` requests.
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, RawQuery, State};
use axum::response::{IntoResponse, Response};
use hyper::StatusCode;

use crate::container::HttpContainer;
use crate::servers::http::v1::query::Query;
use crate::servers::http::v1::requests::scrape::Scrape;
use crate::servers::http::v1::responses::error::Error;
use crate::servers::http::v1::responses::scrape as scrape_response;

/// It handles the `scrape` request, applying the `scrape_allowed` policy:
/// `none` refuses everything, `specific` requires explicit info hashes,
/// `full` also answers the hash-less full scrape.
pub async fn handle(
    State(container): State<Arc<HttpContainer>>,
    RawQuery(raw_query): RawQuery,
    ConnectInfo(remote_addr): ConnectInfo<SocketAddr>,
) -> Response {
    match handle_scrape(&container, raw_query.as_deref(), remote_addr).await {
        Ok(body) => (StatusCode::OK, body).into_response(),
        Err(error) => error.into_response(),
    }
}

async fn handle_scrape(
    container: &Arc<HttpContainer>,
    raw_query: Option<&str>,
    remote_addr: SocketAddr,
) -> Result<Vec<u8>, Error> {
    let query = Query::parse(raw_query.unwrap_or(""));
    let scrape_request = Scrape::from_query(&query)?;

    tracing::debug!("http scrape request from {remote_addr}: {scrape_request:?}");

    let policy = container.core_config.scrape_allowed;

    let scrape_data = if scrape_request.info_hashes.is_empty() {
        if !policy.allows_full() {
            return Err(Error::not_authorized(
                "full scrape function is not available with this tracker.",
            ));
        }
        container.scrape_handler.scrape_all().await
    } else {
        if !policy.allows_specific() {
            return Err(Error::not_authorized(
                "specific scrape function is not available with this tracker.",
            ));
        }
        container.scrape_handler.scrape(&scrape_request.info_hashes).await
    };

    let names = if container.core_config.show_names {
        let mut names = scrape_response::ScrapeNames::new();
        for info_hash in scrape_data.files.keys() {
            if let Some(entry) = container.in_memory_whitelist.get(info_hash).await {
                names.insert(*info_hash, entry.name);
            }
        }
        names
    } else {
        scrape_response::ScrapeNames::new()
    };

    Ok(scrape_response::body(&scrape_data, &names))
}
