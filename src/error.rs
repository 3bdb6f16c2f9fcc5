//! Request-level error taxonomy.
//!
//! Every failure the proxy itself produces maps to a fixed status code and a
//! fixed plaintext body. Upstream error statuses are not errors here; they are
//! mirrored back like any other response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Failures that short-circuit a request with a synthesized response.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProxyError {
    /// The gatekeeper header was missing or did not match the shared secret.
    #[error("Missing or invalid PROXYKEY header.")]
    Unauthorized,

    /// The path did not yield a subdomain and a remainder.
    #[error("URL format invalid. Expected /subdomain/path")]
    MalformedPath,

    /// The inbound body exceeded the configured limit.
    #[error("Request body too large.")]
    PayloadTooLarge,

    /// Every attempt failed at the transport level.
    #[error("Proxy failed to connect. Please try again.")]
    RetriesExhausted { attempts: u32 },

    /// A fault inside the proxy (caught panic, broken invariant).
    #[error("Internal proxy error.")]
    Internal,
}

impl ProxyError {
    /// Status code surfaced to the caller.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Unauthorized => StatusCode::PROXY_AUTHENTICATION_REQUIRED,
            ProxyError::MalformedPath => StatusCode::BAD_REQUEST,
            ProxyError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::RetriesExhausted { .. } | ProxyError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Short label used in logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            ProxyError::Unauthorized => "unauthorized",
            ProxyError::MalformedPath => "malformed_path",
            ProxyError::PayloadTooLarge => "payload_too_large",
            ProxyError::RetriesExhausted { .. } => "retries_exhausted",
            ProxyError::Internal => "internal",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}
