//! The HTTP server instance.
use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;

use super::v1::handlers;
use crate::container::HttpContainer;

/// Builds the router with the tracker's endpoint set.
#[must_use]
pub fn router(http_container: Arc<HttpContainer>) -> Router {
    Router::new()
        .route("/announce", get(handlers::announce::handle))
        .route("/scrape", get(handlers::scrape::handle))
        .route("/", get(handlers::misc::info_page))
        .route("/file", get(handlers::misc::torrent_file))
        .route("/favicon.ico", get(handlers::misc::favicon))
        .with_state(http_container)
}

/// Binds and serves until the task is aborted.
///
/// # Panics
///
/// Panics when the socket cannot be bound or the server dies; the process
/// cannot do anything useful without its announce endpoint.
pub async fn start(bind_to: SocketAddr, tls: Option<RustlsConfig>, http_container: Arc<HttpContainer>) {
    let app = router(http_container);

    let socket = std::net::TcpListener::bind(bind_to).expect("could not bind the tracker socket");
    socket.set_nonblocking(true).expect("could not configure the tracker socket");
    let address = socket.local_addr().expect("could not read the bound address");

    let protocol = if tls.is_some() { "https" } else { "http" };
    tracing::info!("HTTP tracker started on: {protocol}://{address}");

    match tls {
        Some(tls) => axum_server::from_tcp_rustls(socket, tls)
            .serve(app.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .expect("the HTTP tracker server crashed"),
        None => axum_server::from_tcp(socket)
            .serve(app.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .expect("the HTTP tracker server crashed"),
    }
}
