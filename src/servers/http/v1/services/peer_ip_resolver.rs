//! Peer IP resolution.
//!
//! Trackers ignore self-reported addresses by default: the peer's address
//! is whatever the connection (or a trusted proxy header) says. The
//! `only_local_override_ip` policy decides when the `ip` parameter and
//! forwarded-for headers are honored anyway. Overrides from machines on
//! local networks are always fine, since those peers genuinely cannot be
//! reached at their connection address.
use std::net::IpAddr;

use thiserror::Error;

/// Where a client address can come from.
#[derive(Debug, Clone, Copy)]
pub struct ClientIpSources {
    /// The right-most `X-Forwarded-For` entry, when present.
    pub right_most_x_forwarded_for: Option<IpAddr>,

    /// The address of the TCP connection itself.
    pub connection_info_ip: Option<IpAddr>,
}

/// Resolves the peer's address from the connection, the proxy headers and
/// the optional `ip` parameter.
///
/// With `restrict_to_local` set, forwarded headers and the `ip` parameter
/// are only honored for clients connecting from local networks.
///
/// # Errors
///
/// Fails when not even the connection address is known.
pub fn invoke(
    restrict_to_local: bool,
    sources: &ClientIpSources,
    given_ip: Option<IpAddr>,
) -> Result<IpAddr, PeerIpResolutionError> {
    let mut ip = sources.connection_info_ip.ok_or(PeerIpResolutionError::MissingClientIp)?;

    if let Some(forwarded) = sources.right_most_x_forwarded_for {
        if !restrict_to_local {
            ip = forwarded;
        }
    }

    if let Some(given_ip) = given_ip {
        if !restrict_to_local || is_local_ip(&ip) {
            return Ok(given_ip);
        }
    }

    Ok(ip)
}

/// Whether an address belongs to a private or loopback range.
#[must_use]
pub fn is_local_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let octets = v4.octets();
            v4.is_loopback()
                || v4.is_private()
                || (octets[0] == 169 && octets[1] == 254)
        }
        IpAddr::V6(v6) => v6.is_loopback(),
    }
}

/// Errors raised while resolving the peer address.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PeerIpResolutionError {
    #[error("cannot get the client IP from the connection info")]
    MissingClientIp,
}
