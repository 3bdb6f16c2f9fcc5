//! Outbound HTTP transport.
//!
//! The forwarder talks to an [`Upstream`], a "send request, get response or
//! error" seam. Production uses [`ReqwestUpstream`], one pooled client shared
//! by every request in the process.

use std::time::Duration;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode};
use futures_util::future::BoxFuture;
use thiserror::Error;
use url::Url;

use crate::config::TimeoutConfig;

/// A fully rewritten request ready for the wire.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// A complete upstream response, body buffered.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Boxed cause carried by a [`TransportError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure to obtain a complete HTTP response at all.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("upstream timed out: {0}")]
    Timeout(#[source] BoxError),
    #[error("upstream connection failed: {0}")]
    Connect(#[source] BoxError),
    #[error("upstream response body failed: {0}")]
    Body(#[source] BoxError),
    #[error("upstream request failed: {0}")]
    Request(#[source] BoxError),
}

impl TransportError {
    fn classify(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(err.into())
        } else if err.is_connect() {
            TransportError::Connect(err.into())
        } else if err.is_body() || err.is_decode() {
            TransportError::Body(err.into())
        } else {
            TransportError::Request(err.into())
        }
    }

    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            TransportError::Timeout(_) => "timeout",
            TransportError::Connect(_) => "connect",
            TransportError::Body(_) => "body",
            TransportError::Request(_) => "request",
        }
    }
}

/// Thread-safe "send request, get response or transport error" operation.
pub trait Upstream: Send + Sync {
    fn send(&self, request: OutboundRequest) -> BoxFuture<'_, Result<UpstreamResponse, TransportError>>;
}

/// Pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestUpstream {
    client: reqwest::Client,
}

impl ReqwestUpstream {
    /// Client builder carrying the configured timeouts. Callers may add
    /// settings (DNS overrides, proxies) before building.
    pub fn builder(timeouts: &TimeoutConfig) -> reqwest::ClientBuilder {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.read_secs))
            .pool_idle_timeout(Duration::from_secs(timeouts.idle_secs))
            .redirect(reqwest::redirect::Policy::none())
    }

    pub fn from_config(timeouts: &TimeoutConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(Self::builder(timeouts).build()?))
    }

    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Upstream for ReqwestUpstream {
    fn send(&self, request: OutboundRequest) -> BoxFuture<'_, Result<UpstreamResponse, TransportError>> {
        Box::pin(async move {
            let response = self
                .client
                .request(request.method, request.url)
                .headers(request.headers)
                .body(request.body)
                .send()
                .await
                .map_err(TransportError::classify)?;

            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await.map_err(TransportError::classify)?;

            Ok(UpstreamResponse {
                status,
                headers,
                body,
            })
        })
    }
}
