//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all proxy handler
//! - Wire up middleware (request ID, tracing, panic containment, gatekeeper)
//! - Parse the route, buffer the body, hand off to the forwarder
//! - Mirror the terminal response back to the caller
//! - Graceful shutdown on the lifecycle broadcast

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{ConfigError, ProxyConfig};
use crate::error::ProxyError;
use crate::http::request::{request_id, InboundRequest, MakeRequestUuid};
use crate::observability::metrics;
use crate::routing::{RouteTarget, UpstreamTarget};
use crate::security::{gatekeeper_middleware, Gatekeeper, HeaderRewrite, HeaderRewriteError};
use crate::resilience::RetryPolicy;
use crate::upstream::{Forwarder, ProxyResponse, ReqwestUpstream, Upstream};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub forwarder: Arc<Forwarder>,
    pub max_body_size: usize,
}

/// HTTP server for the proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a server forwarding through a pooled `reqwest` client.
    pub fn new(config: ProxyConfig) -> Result<Self, ConfigError> {
        let upstream = ReqwestUpstream::from_config(&config.timeouts)?;
        Self::with_upstream(config, Arc::new(upstream))
    }

    /// Create a server forwarding through the given transport.
    pub fn with_upstream(
        config: ProxyConfig,
        upstream: Arc<dyn Upstream>,
    ) -> Result<Self, ConfigError> {
        let gatekeeper =
            Gatekeeper::from_config(&config.auth).map_err(HeaderRewriteError::from)?;
        let rewrite = HeaderRewrite::from_config(&config.upstream, gatekeeper.header())?;
        let policy = RetryPolicy::from_config(&config.retries);

        if gatekeeper.is_enabled() {
            tracing::info!(header = %gatekeeper.header(), "Proxy key required");
        } else {
            tracing::warn!("No proxy key configured; every request is forwarded");
        }
        tracing::info!(
            scheme = %config.upstream.scheme,
            domain = %config.upstream.domain,
            max_retries = policy.max_retries(),
            max_attempts = policy.max_attempts(),
            backoff = config.retries.backoff,
            read_timeout_secs = config.timeouts.read_secs,
            "Forwarder configured"
        );

        let forwarder = Forwarder::new(
            upstream,
            UpstreamTarget::from_config(&config.upstream),
            rewrite,
            policy,
        );

        let state = AppState {
            forwarder: Arc::new(forwarder),
            max_body_size: config.security.max_body_size,
        };

        let router = Self::build_router(state, Arc::new(gatekeeper));
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState, gatekeeper: Arc<Gatekeeper>) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .route_layer(middleware::from_fn_with_state(
                gatekeeper,
                gatekeeper_middleware,
            ))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TraceLayer::new_for_http().make_span_with(
                        |request: &Request<Body>| {
                            tracing::info_span!(
                                "request",
                                method = %request.method(),
                                uri = %request.uri(),
                                request_id = %request_id(request.headers()),
                            )
                        },
                    ))
                    .layer(CatchPanicLayer::custom(handle_panic)),
            )
    }

    /// The fully layered router, for driving the proxy without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Main proxy handler.
///
/// If the caller disconnects, the server drops this future, abandoning the
/// in-flight upstream call and any pending retries.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let request_id = request_id(request.headers()).to_string();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        uri = %request.uri(),
        "Proxying request"
    );

    let response = match proxy(&state, request, start).await {
        Ok(response) => response.into_response(),
        Err(err) => {
            tracing::warn!(
                request_id = %request_id,
                reason = err.reason(),
                "Request rejected"
            );
            metrics::record_rejected(err.reason());
            err.into_response()
        }
    };

    metrics::record_request(method.as_str(), response.status().as_u16(), start);
    response
}

async fn proxy(
    state: &AppState,
    request: Request<Body>,
    start: Instant,
) -> Result<ProxyResponse, ProxyError> {
    let route = {
        let uri = request.uri();
        let path_and_query = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| uri.path());
        RouteTarget::parse(path_and_query)?
    };

    let inbound = InboundRequest::from_request(request, state.max_body_size, start).await?;
    state.forwarder.forward(&route, &inbound).await
}

/// Contain a handler panic to its own request.
fn handle_panic(err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %detail, "Request handler panicked");
    metrics::record_rejected(ProxyError::Internal.reason());
    ProxyError::Internal.into_response()
}
