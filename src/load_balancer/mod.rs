//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → pool.rs (fixed backend set, built once at startup)
//!     → round_robin.rs (advance cursor, skip dead backends)
//!     → backend.rs (liveness + forwarding delegate)
//!     → Return selected backend or none
//! ```
//!
//! # Design Decisions
//! - Cursor is a lock-free atomic; selection is never serialized behind a mutex
//! - Dead backends excluded from selection
//! - Pool membership never changes after startup

pub mod backend;
pub mod pool;
pub mod round_robin;

pub use backend::Backend;
pub use pool::{BackendPool, PoolError};
pub use round_robin::RoundRobin;
