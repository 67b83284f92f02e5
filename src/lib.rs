//! HTTP round-robin load balancer library.
//!
//! Accepts requests on one port and forwards each to one of a fixed set of
//! backends, skipping dead ones, retrying transient failures in place and
//! failing over to another backend before giving up with 503.

pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod resilience;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
