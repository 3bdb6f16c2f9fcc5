//! Header manipulation between inbound, outbound and mirrored messages.
//!
//! # Responsibilities
//! - Copy inbound headers onto the outbound request, multi-values intact
//! - Force the spoofed `User-Agent` and `Accept` values
//! - Strip identity-marker headers, the gatekeeper header and hop-by-hop headers
//!
//! # Design Decisions
//! - `Host` and `Content-Length` belong to the new target and are left to the client
//! - Hop-by-hop headers are never mirrored in either direction

use axum::http::{
    header::{self, InvalidHeaderName, InvalidHeaderValue},
    HeaderMap, HeaderName, HeaderValue,
};
use thiserror::Error;

use crate::config::UpstreamConfig;

/// Headers scoped to a single connection (RFC 9110 §7.6.1).
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Returns true for connection-scoped headers that must not cross the proxy.
pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

#[derive(Debug, Error)]
pub enum HeaderRewriteError {
    #[error(transparent)]
    Name(#[from] InvalidHeaderName),
    #[error(transparent)]
    Value(#[from] InvalidHeaderValue),
}

/// Outbound header policy, compiled once at startup.
#[derive(Debug, Clone)]
pub struct HeaderRewrite {
    user_agent: HeaderValue,
    accept: HeaderValue,
    strip: Vec<HeaderName>,
}

impl HeaderRewrite {
    /// Compile the policy. `gatekeeper_header` is stripped along with the
    /// configured identity headers.
    pub fn from_config(
        config: &UpstreamConfig,
        gatekeeper_header: &HeaderName,
    ) -> Result<Self, HeaderRewriteError> {
        let mut strip = config
            .strip_headers
            .iter()
            .map(|name| HeaderName::from_bytes(name.trim().as_bytes()))
            .collect::<Result<Vec<_>, _>>()?;
        strip.push(gatekeeper_header.clone());

        Ok(Self {
            user_agent: HeaderValue::from_str(&config.user_agent)?,
            accept: HeaderValue::from_str(&config.accept)?,
            strip,
        })
    }

    /// Build the outbound header set from the inbound one.
    pub fn apply(&self, inbound: &HeaderMap) -> HeaderMap {
        let mut outbound = HeaderMap::with_capacity(inbound.len() + 2);

        for (name, value) in inbound {
            if self.should_drop(name) {
                continue;
            }
            outbound.append(name.clone(), value.clone());
        }

        outbound.insert(header::USER_AGENT, self.user_agent.clone());
        outbound.insert(header::ACCEPT, self.accept.clone());
        outbound
    }

    fn should_drop(&self, name: &HeaderName) -> bool {
        is_hop_by_hop(name)
            || *name == header::HOST
            || *name == header::CONTENT_LENGTH
            || self.strip.contains(name)
    }
}
