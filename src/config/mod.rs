//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults
//!     → loader.rs (optional TOML file, then environment overlay)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → handed to HttpServer, which builds the gatekeeper and forwarder from it
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup; there is no reload
//! - All fields have defaults to allow minimal configs
//! - Environment variables win over the file
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{finalize, load_file, ConfigError};
pub use schema::{
    AuthConfig, ListenerConfig, ObservabilityConfig, ProxyConfig, RetryConfig, SecurityConfig,
    TimeoutConfig, UpstreamConfig,
};
pub use validation::ValidationError;
