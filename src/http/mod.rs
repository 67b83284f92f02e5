//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → request.rs (buffer body, strip hop-by-hop headers)
//!     → coordinator.rs (select peer, retry, fail over)
//!     → client.rs (delegate call to the chosen backend)
//!     → response.rs (pass through, or 503)
//!     → Send to client
//! ```

pub mod client;
pub mod coordinator;
pub mod request;
pub mod response;
pub mod server;

pub use client::{Forward, ForwardError, HttpForwarder};
pub use coordinator::{Coordinator, Outcome};
pub use server::HttpServer;
