//! The forwarding pipeline.
//!
//! Builds the outbound request from the inbound one, sends it through the
//! shared [`Upstream`], and retries transport failures up to the configured
//! bound. Any HTTP response ends the loop, whatever its status.

use std::sync::Arc;

use url::Url;

use crate::error::ProxyError;
use crate::http::request::InboundRequest;
use crate::observability::metrics;
use crate::resilience::RetryPolicy;
use crate::routing::{RouteTarget, UpstreamTarget};
use crate::security::HeaderRewrite;
use crate::upstream::client::{OutboundRequest, Upstream, UpstreamResponse};

/// Terminal outcome of forwarding one request.
#[derive(Debug)]
pub enum ProxyResponse {
    /// Whatever the upstream answered, 4xx/5xx included.
    Upstream(UpstreamResponse),
    /// Every attempt failed at the transport level.
    Exhausted { attempts: u32 },
}

impl ProxyResponse {
    pub fn is_upstream(&self) -> bool {
        matches!(self, ProxyResponse::Upstream(_))
    }
}

/// Sends requests upstream with bounded retries.
#[derive(Clone)]
pub struct Forwarder {
    upstream: Arc<dyn Upstream>,
    target: UpstreamTarget,
    rewrite: HeaderRewrite,
    policy: RetryPolicy,
}

impl Forwarder {
    pub fn new(
        upstream: Arc<dyn Upstream>,
        target: UpstreamTarget,
        rewrite: HeaderRewrite,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            upstream,
            target,
            rewrite,
            policy,
        }
    }

    /// Build the request sent on every attempt.
    pub fn build_request(
        &self,
        url: Url,
        inbound: &InboundRequest,
    ) -> OutboundRequest {
        OutboundRequest {
            method: inbound.method.clone(),
            url,
            headers: self.rewrite.apply(&inbound.headers),
            body: inbound.body.clone(),
        }
    }

    /// Forward `inbound` to the upstream named by `route`.
    ///
    /// Fails only if the route cannot be turned into a URL; transport
    /// failures surface as [`ProxyResponse::Exhausted`].
    pub async fn forward(
        &self,
        route: &RouteTarget,
        inbound: &InboundRequest,
    ) -> Result<ProxyResponse, ProxyError> {
        let url = self.target.url_for(route)?;
        let outbound = self.build_request(url, inbound);
        let mut state = self.policy.start();

        loop {
            let attempt = state.current();
            match self.upstream.send(outbound.clone()).await {
                Ok(response) => {
                    tracing::debug!(
                        url = %outbound.url,
                        attempt,
                        status = %response.status,
                        elapsed_ms = inbound.received_at.elapsed().as_millis() as u64,
                        "Upstream responded"
                    );
                    return Ok(ProxyResponse::Upstream(response));
                }
                Err(err) => {
                    tracing::warn!(
                        url = %outbound.url,
                        attempt,
                        kind = err.kind(),
                        error = %err,
                        "Upstream transport failure"
                    );

                    match state.on_failure() {
                        Some(delay) => {
                            metrics::record_retry(err.kind());
                            if !delay.is_zero() {
                                tracing::info!(attempt, delay = ?delay, "Retrying after backoff");
                                tokio::time::sleep(delay).await;
                            }
                        }
                        None => {
                            tracing::error!(
                                url = %outbound.url,
                                attempts = attempt,
                                elapsed_ms = inbound.received_at.elapsed().as_millis() as u64,
                                "Retries exhausted"
                            );
                            metrics::record_exhausted();
                            return Ok(ProxyResponse::Exhausted { attempts: attempt });
                        }
                    }
                }
            }
        }
    }
}
