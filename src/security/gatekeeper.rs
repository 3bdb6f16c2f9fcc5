//! Shared-secret gatekeeper.
//!
//! Runs before any routing or forwarding. An empty secret disables the check
//! entirely; otherwise the configured header must carry the exact secret.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderName, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::AuthConfig;
use crate::error::ProxyError;
use crate::observability::metrics;

/// Validates the shared-secret header.
#[derive(Debug, Clone)]
pub struct Gatekeeper {
    secret: Option<Vec<u8>>,
    header: HeaderName,
}

impl Gatekeeper {
    /// Build from config. Fails only if the header name is not valid.
    pub fn from_config(config: &AuthConfig) -> Result<Self, axum::http::header::InvalidHeaderName> {
        let header = HeaderName::from_bytes(config.header.as_bytes())?;
        let secret = config
            .is_enabled()
            .then(|| config.key.as_bytes().to_vec());
        Ok(Self { secret, header })
    }

    pub fn is_enabled(&self) -> bool {
        self.secret.is_some()
    }

    /// Header that carries the secret. Never forwarded upstream.
    pub fn header(&self) -> &HeaderName {
        &self.header
    }

    /// Pass/fail for a request's headers.
    pub fn check(&self, headers: &HeaderMap) -> Result<(), ProxyError> {
        let Some(secret) = &self.secret else {
            return Ok(());
        };

        let presented = headers
            .get(&self.header)
            .map(|v| v.as_bytes())
            .unwrap_or_default();

        if constant_time_eq(presented, secret) {
            Ok(())
        } else {
            Err(ProxyError::Unauthorized)
        }
    }
}

/// Byte comparison whose running time depends only on the lengths.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Middleware rejecting requests that fail the gatekeeper with 407.
pub async fn gatekeeper_middleware(
    State(gatekeeper): State<Arc<Gatekeeper>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match gatekeeper.check(request.headers()) {
        Ok(()) => next.run(request).await,
        Err(err) => {
            tracing::warn!(
                method = %request.method(),
                path = %request.uri().path(),
                "Rejected request without valid proxy key"
            );
            metrics::record_rejected(err.reason());
            err.into_response()
        }
    }
}
