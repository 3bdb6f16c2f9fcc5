//! Retry bookkeeping.
//!
//! # Responsibilities
//! - Count attempts for one request (1-based)
//! - Decide whether a transport failure earns another attempt
//! - Supply the delay before the next attempt
//!
//! # Design Decisions
//! - Bound is `max_retries` retries after the first attempt, so at most
//!   `max_retries + 1` outbound calls per request
//! - Immediate retries by default; backoff is opt-in

use std::time::Duration;

use crate::config::RetryConfig;
use crate::resilience::backoff::Backoff;

/// Per-process retry policy, built once from config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff: Option<Backoff>,
}

impl RetryPolicy {
    /// Immediate retries, at most `max_retries` of them.
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: None,
        }
    }

    /// Sleep with capped exponential backoff between attempts.
    pub fn with_backoff(mut self, base_ms: u64, max_ms: u64) -> Self {
        self.backoff = Some(Backoff::from_millis(base_ms, max_ms));
        self
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        let policy = Self::new(config.max_retries);
        if config.backoff {
            policy.with_backoff(config.base_delay_ms, config.max_delay_ms)
        } else {
            policy
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Upper bound on outbound calls for one request.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Fresh attempt counter for a new request.
    pub fn start(&self) -> AttemptState {
        AttemptState {
            attempt: 1,
            policy: *self,
        }
    }
}

/// Attempt counter for a single request.
#[derive(Debug, Clone)]
pub struct AttemptState {
    attempt: u32,
    policy: RetryPolicy,
}

impl AttemptState {
    /// The attempt currently in flight (1-based).
    pub fn current(&self) -> u32 {
        self.attempt
    }

    /// Record a transport failure of the current attempt.
    ///
    /// Returns the delay before the next attempt, or `None` when the bound is
    /// exhausted and the request must fail.
    pub fn on_failure(&mut self) -> Option<Duration> {
        if self.attempt >= self.policy.max_attempts() {
            return None;
        }

        let delay = self
            .policy
            .backoff
            .map_or(Duration::ZERO, |backoff| backoff.delay(self.attempt));
        self.attempt += 1;
        Some(delay)
    }
}
