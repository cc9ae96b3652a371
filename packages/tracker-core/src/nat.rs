//! NAT connect-back probing.
//!
//! Every peer is assumed to be behind a NAT until the tracker manages to
//! open a TCP connection back to the endpoint the peer announced. NAT'd
//! peers stay usable as path endpoints but are never selected as overlay
//! neighbors for others, since nobody could dial them.
//!
//! One probe runs per announce while the peer is still flagged, up to the
//! configured attempt cap; each probe carries its own timeout and a timed
//! out probe counts as a failure.
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anomos_tracker_configuration::Core;
use anomos_tracker_primitives::peer_id::PeerId;
use tokio::net::TcpStream;

use crate::graph::repository::InMemoryNetwork;

/// Probes announced endpoints and clears the NAT flag on success.
pub struct NatChecker {
    /// How many probes to run before giving up; `0` disables probing.
    attempts: u8,

    /// Per-probe timeout.
    timeout: Duration,

    /// The in-memory overlay graph.
    network: Arc<InMemoryNetwork>,
}

impl NatChecker {
    #[must_use]
    pub fn new(config: &Core, network: &Arc<InMemoryNetwork>) -> Self {
        Self {
            attempts: config.nat_check,
            timeout: Duration::from_secs(u64::from(config.socket_timeout)),
            network: network.clone(),
        }
    }

    /// Runs one connect-back probe for `peer_id` if it still needs one.
    ///
    /// Success marks the peer reachable; failure is recorded against the
    /// attempt cap and the peer stays flagged.
    pub async fn check(&self, peer_id: PeerId) {
        if self.attempts == 0 {
            return;
        }
        if self.network.is_natted(&peer_id) != Some(true) {
            return;
        }
        if self.network.nat_probes(&peer_id).unwrap_or(u8::MAX) >= self.attempts {
            return;
        }

        let Some((ip, port)) = self.network.endpoint(&peer_id) else {
            return;
        };
        let addr = SocketAddr::new(ip, port);

        if probe(addr, self.timeout).await {
            tracing::debug!("connect-back to {addr} succeeded; {peer_id} is reachable");
            self.network.set_reachable(&peer_id);
        } else if let Some(count) = self.network.record_nat_probe_failure(&peer_id) {
            tracing::debug!("connect-back to {addr} failed ({count}/{})", self.attempts);
        }
    }
}

/// One TCP connect attempt with a timeout.
async fn probe(addr: SocketAddr, timeout: Duration) -> bool {
    matches!(tokio::time::timeout(timeout, TcpStream::connect(addr)).await, Ok(Ok(_)))
}
