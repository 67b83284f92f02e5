//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Fixed-interval timer
//!     → HEAD probe to each backend (bounded timeout)
//!     → set_alive(true) on 2xx, set_alive(false) otherwise
//!
//! Passive health checks (passive.rs):
//!     Request exhausts its retries against one backend
//!     → set_alive(false)
//! ```
//!
//! # Design Decisions
//! - Active and passive checks are complementary
//! - A single probe flips liveness; there is no hysteresis
//! - Probing cadence is fixed regardless of failure streaks

pub mod active;
pub mod passive;

pub use active::HealthMonitor;
