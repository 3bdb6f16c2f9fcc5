//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → gatekeeper.rs (shared-secret check, 407 on failure)
//!     → routing
//!     → headers.rs (strip identity/hop-by-hop headers, force UA and Accept)
//!     → upstream
//! ```
//!
//! # Design Decisions
//! - Fail closed: a configured secret must match exactly
//! - An empty secret is an explicit open mode, logged at startup
//! - The caller never gets to assert an identity the upstream trusts

pub mod gatekeeper;
pub mod headers;

pub use gatekeeper::{gatekeeper_middleware, Gatekeeper};
pub use headers::{is_hop_by_hop, HeaderRewrite, HeaderRewriteError};
