//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::observability::logging::LogFormat;

/// Root configuration for the proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind host and port).
    pub listener: ListenerConfig,

    /// Upstream target template and outbound header policy.
    pub upstream: UpstreamConfig,

    /// Shared-secret gatekeeper.
    pub auth: AuthConfig,

    /// Outbound client timeouts.
    pub timeouts: TimeoutConfig,

    /// Retry configuration.
    pub retries: RetryConfig,

    /// Inbound request limits.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// Listen port.
    pub port: u16,
}

impl ListenerConfig {
    /// `host:port` string suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Where requests are forwarded and how outbound headers are rewritten.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Domain appended to the subdomain segment (may carry a `:port`).
    pub domain: String,

    /// URL scheme for outbound requests.
    pub scheme: String,

    /// Forced `User-Agent` value.
    pub user_agent: String,

    /// Forced `Accept` value.
    pub accept: String,

    /// Identity-marker headers that are never forwarded.
    pub strip_headers: Vec<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            domain: "roblox.com".to_string(),
            scheme: "https".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64)".to_string(),
            accept: "application/json".to_string(),
            strip_headers: vec!["Roblox-Id".to_string()],
        }
    }
}

/// Shared-secret gatekeeper configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared secret. Empty disables the check.
    pub key: String,

    /// Header carrying the secret.
    pub header: String,
}

impl AuthConfig {
    /// Whether requests must present the secret.
    pub fn is_enabled(&self) -> bool {
        !self.key.is_empty()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            key: String::new(),
            header: "PROXYKEY".to_string(),
        }
    }
}

/// Timeout configuration for the outbound client.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Per-attempt timeout in seconds.
    pub read_secs: u64,

    /// Idle pooled connection lifetime in seconds.
    pub idle_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            read_secs: 10,
            idle_secs: 60,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt (total attempts = max_retries + 1).
    pub max_retries: u32,

    /// Sleep with exponential backoff between attempts.
    pub backoff: bool,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: false,
            base_delay_ms: 100,
            max_delay_ms: 2000,
        }
    }
}

/// Inbound request limits.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
