//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path and query)
//!     → target.rs (RouteTarget::parse)
//!     → Return: RouteTarget or MalformedPath (400)
//!
//! Per request:
//!     RouteTarget + UpstreamTarget
//!     → https://{subdomain}.{domain}/{remainder}
//! ```
//!
//! # Design Decisions
//! - No route table: the first path segment names the upstream host
//! - Deterministic: same input always yields the same URL
//! - Malformed paths fail before any outbound call

pub mod target;

pub use target::{RouteTarget, UpstreamTarget};
