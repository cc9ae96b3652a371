//! HTTP announce endpoint configuration.
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The `[http_tracker]` section.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct HttpTracker {
    /// The address the listening socket binds to.
    pub bind: IpAddr,

    /// The port the listening socket binds to. Port `0` asks the OS for a
    /// free one.
    pub port: u16,

    /// TLS material. When absent the endpoint speaks plain HTTP and TLS
    /// termination is expected to happen in a fronting proxy.
    pub tsl_config: Option<Tsl>,
}

impl Default for HttpTracker {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 80,
            tsl_config: None,
        }
    }
}

/// TLS certificate and key paths.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Tsl {
    /// Path of the certificate file (PEM).
    pub ssl_cert_path: PathBuf,

    /// Path of the private key file (PEM).
    pub ssl_key_path: PathBuf,
}
