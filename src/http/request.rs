//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) for every inbound request
//! - Capture the inbound request as an owned, replayable value
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - A caller-supplied `x-request-id` is kept rather than replaced
//! - The body is buffered once; every attempt replays the same bytes

use std::time::Instant;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, HeaderValue, Method, Request};
use tower_http::request_id::{MakeRequestId, RequestId};

use crate::error::ProxyError;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Read the request ID set by the request-id layer.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// An inbound request, fully buffered.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub received_at: Instant,
}

impl InboundRequest {
    /// Buffer the body of `request`, refusing bodies above `max_body_size`.
    pub async fn from_request(
        request: Request<Body>,
        max_body_size: usize,
        received_at: Instant,
    ) -> Result<Self, ProxyError> {
        let (parts, body) = request.into_parts();
        // The other failure is an aborted stream, whose caller never sees a reply.
        let body = axum::body::to_bytes(body, max_body_size)
            .await
            .map_err(|_| ProxyError::PayloadTooLarge)?;

        Ok(Self {
            method: parts.method,
            headers: parts.headers,
            body,
            received_at,
        })
    }
}
