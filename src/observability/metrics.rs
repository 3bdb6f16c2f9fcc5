//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by method, status
//! - `proxy_request_duration_seconds` (histogram): latency by method
//! - `proxy_upstream_retries_total` (counter): retries by transport failure kind
//! - `proxy_upstream_exhausted_total` (counter): requests that ran out of attempts
//! - `proxy_rejected_total` (counter): requests the proxy answered itself, by reason
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - No per-subdomain labels; the first path segment is caller-controlled

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter with its own HTTP listener.
///
/// Must be called from inside the Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record a completed request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    let method = method.to_string();
    counter!(
        "proxy_requests_total",
        "method" => method.clone(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("proxy_request_duration_seconds", "method" => method)
        .record(start.elapsed().as_secs_f64());
}

/// Record a retry after a transport failure.
pub fn record_retry(kind: &'static str) {
    counter!("proxy_upstream_retries_total", "kind" => kind).increment(1);
}

/// Record a request that exhausted its attempts.
pub fn record_exhausted() {
    counter!("proxy_upstream_exhausted_total").increment(1);
}

/// Record a request answered by the proxy without forwarding.
pub fn record_rejected(reason: &'static str) {
    counter!("proxy_rejected_total", "reason" => reason).increment(1);
}
