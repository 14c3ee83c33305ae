//! API error classification

use thiserror::Error;

/// HTTP status codes worth retrying: timeouts, throttling, and 5xx
const RETRYABLE_STATUS_CODES: &[u16] = &[408, 425, 429, 500, 502, 503, 504];

/// Errors from AtomSphere API calls
#[derive(Error, Debug)]
pub enum ApiError {
    /// The platform answered with a non-success status
    #[error("HTTP {status} from {endpoint}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// The request never completed (connect, timeout, TLS, ...)
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The response body was not the JSON shape we expect
    #[error("failed to decode {endpoint} response: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The HTTP client itself could not be constructed
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl ApiError {
    /// The HTTP status code, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether this is a credential/authorization rejection (401/403)
    ///
    /// These indicate misconfiguration, not a transient fault, and abort
    /// the run without retries.
    pub fn is_auth(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }

    /// Whether another attempt could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Status { status, .. } => RETRYABLE_STATUS_CODES.contains(status),
            // Network-level failures are retryable; decode and build
            // failures are not.
            ApiError::Transport { .. } => true,
            ApiError::Decode { .. } | ApiError::Client(_) => false,
        }
    }
}
