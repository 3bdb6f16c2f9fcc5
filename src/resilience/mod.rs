//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to upstream:
//!     → reqwest client (per-attempt timeout)
//!     → On transport failure: retries.rs (attempt budget, optional backoff.rs delay)
//!     → On any HTTP response: done, never retried
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every outbound call has a deadline
//! - Only transport failures are retried, never upstream status codes
//! - Retries are immediate unless backoff is switched on

pub mod backoff;
pub mod retries;

pub use backoff::Backoff;
pub use retries::{AttemptState, RetryPolicy};
