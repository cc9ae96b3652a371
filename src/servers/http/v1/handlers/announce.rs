//! Axum handler for the `announce` requests.
//!
//! The handler decodes the raw query, resolves the peer's address under
//! the configured trust policy, authorizes the torrent, and hands the
//! typed request to the core announce handler. On the way out it spawns a
//! NAT connect-back probe for peers that still need one and assembles the
//! bencoded reply.
use std::net::SocketAddr;
use std::sync::Arc;

use anomos_tracker_core::announce_handler::AnnounceRequest;
use anomos_tracker_primitives::event::AnnounceEvent;
use axum::extract::{ConnectInfo, RawQuery, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use hyper::StatusCode;

use super::right_most_forwarded_for;
use crate::container::HttpContainer;
use crate::servers::http::v1::query::Query;
use crate::servers::http::v1::requests::announce::Announce;
use crate::servers::http::v1::responses::announce as announce_response;
use crate::servers::http::v1::responses::error::Error;
use crate::servers::http::v1::services::peer_ip_resolver::{self, ClientIpSources};

/// It handles the `announce` request.
pub async fn handle(
    State(container): State<Arc<HttpContainer>>,
    RawQuery(raw_query): RawQuery,
    headers: HeaderMap,
    ConnectInfo(remote_addr): ConnectInfo<SocketAddr>,
) -> Response {
    match handle_announce(&container, raw_query.as_deref(), &headers, remote_addr).await {
        Ok(body) => (StatusCode::OK, body).into_response(),
        Err(error) => error.into_response(),
    }
}

async fn handle_announce(
    container: &Arc<HttpContainer>,
    raw_query: Option<&str>,
    headers: &HeaderMap,
    remote_addr: SocketAddr,
) -> Result<Vec<u8>, Error> {
    let query = Query::parse(raw_query.unwrap_or(""));
    let announce_request = Announce::from_query(&query)?;

    tracing::debug!("http announce request from {}: {announce_request:?}", remote_addr);

    let client_ip_sources = ClientIpSources {
        right_most_x_forwarded_for: right_most_forwarded_for(headers),
        connection_info_ip: Some(remote_addr.ip()),
    };
    let peer_ip = peer_ip_resolver::invoke(container.restrict_to_local, &client_ip_sources, announce_request.ip)?;

    container
        .whitelist_authorization
        .authorize(&announce_request.info_hash)
        .await?;

    let core_request = AnnounceRequest {
        peer_id: announce_request.peer_id,
        info_hash: announce_request.info_hash,
        port: announce_request.port,
        downloaded: announce_request.downloaded,
        left: announce_request.left,
        event: announce_request.event,
        numwant: announce_request.numwant,
        failed: announce_request.failed.clone(),
        public_key: announce_request.public_key,
    };

    let announce_data = container.announce_handler.announce(&core_request, &peer_ip)?;

    // Probe the peer's reachability in the background; the reply does not
    // wait for it.
    if announce_request.event != AnnounceEvent::Stopped && container.core_config.nat_check > 0 {
        let nat_checker = container.nat_checker.clone();
        let peer_id = announce_request.peer_id;
        tokio::spawn(async move {
            nat_checker.check(peer_id).await;
        });
    }

    let scrape = if announce_request.include_scrape {
        let metadata = container.network.swarm_metadata(&announce_request.info_hash);
        let name = if container.core_config.show_names {
            container
                .in_memory_whitelist
                .get(&announce_request.info_hash)
                .await
                .map(|entry| entry.name)
        } else {
            None
        };
        Some(announce_response::ScrapeEntry {
            complete: metadata.complete,
            incomplete: metadata.incomplete,
            downloaded: metadata.downloaded,
            name,
        })
    } else {
        None
    };

    Ok(announce_response::Announce::from_data(&announce_data, scrape).body())
}
