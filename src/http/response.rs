//! Response mirroring.
//!
//! # Responsibilities
//! - Copy the upstream status, headers and body back to the caller
//! - Turn exhausted retries into the fixed 500 response
//!
//! # Design Decisions
//! - Upstream headers are appended onto an empty map, so they win over any
//!   framework default and multi-value headers (`Set-Cookie`) survive
//! - Hop-by-hop headers describe the upstream connection and are dropped
//! - The body is opaque bytes: no sniffing, no transcoding

use axum::body::Body;
use axum::response::{IntoResponse, Response};

use crate::error::ProxyError;
use crate::security::is_hop_by_hop;
use crate::upstream::{ProxyResponse, UpstreamResponse};

/// Build the caller-facing response from an upstream response.
pub fn mirror(upstream: UpstreamResponse) -> Response {
    let mut response = Response::new(Body::from(upstream.body));
    *response.status_mut() = upstream.status;

    let headers = response.headers_mut();
    for (name, value) in &upstream.headers {
        if is_hop_by_hop(name) {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }

    response
}

impl IntoResponse for ProxyResponse {
    fn into_response(self) -> Response {
        match self {
            ProxyResponse::Upstream(upstream) => mirror(upstream),
            ProxyResponse::Exhausted { attempts } => {
                ProxyError::RetriesExhausted { attempts }.into_response()
            }
        }
    }
}
