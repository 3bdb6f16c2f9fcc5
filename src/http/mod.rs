//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, proxy handler)
//!     → request.rs (request ID, buffered InboundRequest)
//!     → [gatekeeper, routing, forwarder]
//!     → response.rs (mirror upstream response or synthesize failure)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{InboundRequest, MakeRequestUuid, X_REQUEST_ID};
pub use response::mirror;
pub use server::{AppState, HttpServer};
