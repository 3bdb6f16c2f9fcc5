//! Upstream subsystem.
//!
//! # Data Flow
//! ```text
//! RouteTarget + InboundRequest
//!     → forwarder.rs (compose URL, rewrite headers, retry loop)
//!     → client.rs (Upstream trait; shared reqwest client in production)
//!     → ProxyResponse (upstream answer or exhausted retries)
//! ```
//!
//! # Design Decisions
//! - One client per process, shared by every request, never mutated
//! - Transport failures are retried; HTTP statuses are answers
//! - Per-attempt request and response values live only inside the loop body

pub mod client;
pub mod forwarder;

pub use client::{
    BoxError, OutboundRequest, ReqwestUpstream, TransportError, Upstream, UpstreamResponse,
};
pub use forwarder::{Forwarder, ProxyResponse};
