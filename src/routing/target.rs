//! Subdomain routing.
//!
//! # Responsibilities
//! - Split the request path into subdomain and remainder
//! - Reject paths that cannot name an upstream host
//! - Compose the outbound URL from the upstream template
//!
//! # Design Decisions
//! - Split on the first `/` only; the remainder (query included) is not re-parsed
//! - The subdomain is restricted to host characters so it cannot re-target the request

use url::Url;

use crate::config::UpstreamConfig;
use crate::error::ProxyError;

/// The upstream selected by an inbound path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTarget {
    /// First path segment, used as the upstream subdomain.
    pub subdomain: String,
    /// Everything after the first segment, including the query string.
    pub remainder: String,
}

impl RouteTarget {
    /// Parse a request path-and-query such as `/users/v1/users/1?x=1`.
    pub fn parse(path_and_query: &str) -> Result<Self, ProxyError> {
        let trimmed = path_and_query.strip_prefix('/').unwrap_or(path_and_query);
        let (subdomain, remainder) = trimmed.split_once('/').ok_or(ProxyError::MalformedPath)?;

        if remainder.is_empty() || !is_host_fragment(subdomain) {
            return Err(ProxyError::MalformedPath);
        }

        Ok(Self {
            subdomain: subdomain.to_string(),
            remainder: remainder.to_string(),
        })
    }
}

/// Accepts dot-separated DNS labels of ASCII alphanumerics and `-`.
fn is_host_fragment(s: &str) -> bool {
    !s.is_empty()
        && s.split('.').all(|label| {
            !label.is_empty() && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
        })
}

/// The `{scheme}://{subdomain}.{domain}/{remainder}` template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamTarget {
    scheme: String,
    domain: String,
}

impl UpstreamTarget {
    pub fn new(scheme: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            domain: domain.into(),
        }
    }

    pub fn from_config(config: &UpstreamConfig) -> Self {
        Self::new(config.scheme.trim(), config.domain.trim())
    }

    /// Compose the outbound URL for a route.
    ///
    /// The remainder is parsed as a URL path, so `.` and `..` segments
    /// (percent-encoded ones included) are resolved. They can shorten the
    /// path but never change the host.
    pub fn url_for(&self, route: &RouteTarget) -> Result<Url, ProxyError> {
        let raw = format!(
            "{}://{}.{}/{}",
            self.scheme, route.subdomain, self.domain, route.remainder
        );
        Url::parse(&raw).map_err(|e| {
            tracing::debug!(url = %raw, error = %e, "Composed upstream URL is invalid");
            ProxyError::MalformedPath
        })
    }
}
