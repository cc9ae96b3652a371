//! The `failure reason` error reply.
//!
//! Every rejected request is answered with a bencoded dictionary holding a
//! single human-readable `failure reason` key. Validation problems use
//! HTTP 400; authorization refusals answer 200 like a regular tracker
//! reply, so ordinary clients surface the reason instead of a bare error;
//! internal faults answer 500.
use axum::response::{IntoResponse, Response};
use hyper::StatusCode;
use serde::Serialize;

use anomos_tracker_core::error::{AnnounceError, WhitelistError};

use crate::servers::http::v1::requests::announce::ParseAnnounceError;
use crate::servers::http::v1::requests::scrape::ParseScrapeError;
use crate::servers::http::v1::services::peer_ip_resolver::PeerIpResolutionError;

/// A reply carrying only a `failure reason`.
#[derive(Debug, Clone)]
pub struct Error {
    pub failure_reason: String,
    pub status: StatusCode,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    #[serde(rename = "failure reason")]
    failure_reason: &'a str,
}

impl Error {
    /// A validation failure: HTTP 400.
    #[must_use]
    pub fn bad_request(reason: &str) -> Self {
        Self {
            failure_reason: format!("you sent me garbage - {reason}"),
            status: StatusCode::BAD_REQUEST,
        }
    }

    /// An authorization refusal: HTTP 200 plus the reason.
    #[must_use]
    pub fn not_authorized(reason: &str) -> Self {
        Self {
            failure_reason: reason.to_owned(),
            status: StatusCode::OK,
        }
    }

    /// An internal fault: HTTP 500.
    #[must_use]
    pub fn internal(reason: &str) -> Self {
        Self {
            failure_reason: reason.to_owned(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The bencoded error body.
    #[must_use]
    pub fn write(&self) -> Vec<u8> {
        serde_bencode::to_bytes(&ErrorBody {
            failure_reason: &self.failure_reason,
        })
        .unwrap_or_default()
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        (self.status, self.write()).into_response()
    }
}

impl From<ParseAnnounceError> for Error {
    fn from(err: ParseAnnounceError) -> Self {
        Self::bad_request(&err.to_string())
    }
}

impl From<ParseScrapeError> for Error {
    fn from(err: ParseScrapeError) -> Self {
        Self::bad_request(&err.to_string())
    }
}

impl From<AnnounceError> for Error {
    fn from(err: AnnounceError) -> Self {
        Self::bad_request(&err.to_string())
    }
}

impl From<WhitelistError> for Error {
    fn from(err: WhitelistError) -> Self {
        tracing::debug!("request refused: {err}");
        Self::not_authorized("Requested download is not authorized for use with this tracker.")
    }
}

impl From<PeerIpResolutionError> for Error {
    fn from(err: PeerIpResolutionError) -> Self {
        Self::internal(&err.to_string())
    }
}
