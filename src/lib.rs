//! Subdomain-routing reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ gatekeeper ──▶ routing ──▶ forwarder ──▶ https://{subdomain}.{domain}/{rest}
//!                     (407)          (400)       (retry on
//!                                                transport failure)
//!     Client Response                                 │
//!     ◀────────────── response mirror ◀───────────────┘
//!                     (status, headers, body verbatim; 500 when retries run out)
//! ```
//!
//! `/users/v1/users/1` is forwarded to `https://users.roblox.com/v1/users/1`
//! with the configured `User-Agent` and `Accept`, minus identity headers.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod routing;
pub mod security;
pub mod upstream;

pub use config::ProxyConfig;
pub use error::ProxyError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
