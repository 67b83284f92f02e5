//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Delegate call fails:
//!     → retries.rs (retry same backend after a fixed delay, up to max_retries)
//!     → then fail over to the next alive backend, up to max_attempts backends
//! ```
//!
//! # Design Decisions
//! - Counters are per request and passed explicitly, never stored in shared state
//! - Fixed retry delay, no jitter or backoff

pub mod retries;

pub use retries::{Decision, RetryPolicy, RetryState};
