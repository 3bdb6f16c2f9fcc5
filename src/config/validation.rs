//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, backoff base within its cap)
//! - Check that header names and values can be put on the wire
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::{HeaderName, HeaderValue};
use thiserror::Error;

use crate::config::schema::ProxyConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("timeouts.read_secs must be greater than zero")]
    ZeroReadTimeout,
    #[error("retries.base_delay_ms ({base}) exceeds retries.max_delay_ms ({max})")]
    BackoffRange { base: u64, max: u64 },
    #[error("upstream.domain must be a bare host, got {0:?}")]
    InvalidDomain(String),
    #[error("upstream.scheme must be http or https, got {0:?}")]
    InvalidScheme(String),
    #[error("{field} is not a valid header name: {value:?}")]
    InvalidHeaderName { field: &'static str, value: String },
    #[error("{field} is not a valid header value: {value:?}")]
    InvalidHeaderValue { field: &'static str, value: String },
    #[error("security.max_body_size must be greater than zero")]
    ZeroBodyLimit,
    #[error("observability.metrics_address is not a socket address: {0:?}")]
    InvalidMetricsAddress(String),
}

/// Validate a loaded configuration, collecting every problem.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.timeouts.read_secs == 0 {
        errors.push(ValidationError::ZeroReadTimeout);
    }

    let retries = &config.retries;
    if retries.backoff && retries.base_delay_ms > retries.max_delay_ms {
        errors.push(ValidationError::BackoffRange {
            base: retries.base_delay_ms,
            max: retries.max_delay_ms,
        });
    }

    let upstream = &config.upstream;
    let domain = upstream.domain.trim();
    if domain.is_empty()
        || domain.starts_with('.')
        || domain.contains(|c: char| matches!(c, '/' | '?' | '#' | '@') || c.is_whitespace())
    {
        errors.push(ValidationError::InvalidDomain(upstream.domain.clone()));
    }
    if !matches!(upstream.scheme.as_str(), "http" | "https") {
        errors.push(ValidationError::InvalidScheme(upstream.scheme.clone()));
    }

    check_value(&mut errors, "upstream.user_agent", &upstream.user_agent);
    check_value(&mut errors, "upstream.accept", &upstream.accept);
    for name in &upstream.strip_headers {
        check_name(&mut errors, "upstream.strip_headers", name);
    }
    check_name(&mut errors, "auth.header", &config.auth.header);
    if config.auth.is_enabled() {
        check_value(&mut errors, "auth.key", &config.auth.key);
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_name(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if HeaderName::from_bytes(value.as_bytes()).is_err() {
        errors.push(ValidationError::InvalidHeaderName {
            field,
            value: value.to_string(),
        });
    }
}

fn check_value(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if HeaderValue::from_str(value).is_err() {
        errors.push(ValidationError::InvalidHeaderValue {
            field,
            value: value.to_string(),
        });
    }
}
