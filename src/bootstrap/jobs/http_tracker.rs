//! The HTTP tracker job.
use std::net::SocketAddr;
use std::sync::Arc;

use anomos_tracker_configuration::HttpTracker;
use tokio::task::JoinHandle;

use crate::container::HttpContainer;
use crate::servers::http::server;

/// Spawns the HTTP tracker server.
///
/// TLS material, when configured, must load; a tracker that promises TLS
/// and cannot deliver it must not come up in the clear.
pub fn start_job(config: &HttpTracker, http_container: Arc<HttpContainer>) -> JoinHandle<()> {
    let bind_to = SocketAddr::new(config.bind, config.port);
    let tsl_config = config.tsl_config.clone();

    tokio::spawn(async move {
        let tls = match &tsl_config {
            Some(tsl) => Some(
                axum_server::tls_rustls::RustlsConfig::from_pem_file(&tsl.ssl_cert_path, &tsl.ssl_key_path)
                    .await
                    .expect("TLS material could not be loaded"),
            ),
            None => None,
        };

        server::start(bind_to, tls, http_container).await;
    })
}
