//! Retry and failover accounting.
//!
//! # Responsibilities
//! - Carry the per-request `attempts` and `retries` counters
//! - Decide between same-backend retry, failover and termination
//!
//! # Design Decisions
//! - `retries` absorbs short backend-local hiccups; `attempts` caps how many
//!   distinct backends one request may touch
//! - `retries` resets every time a new backend is chosen
//! - Retry delay is a fixed pause, not a backoff curve

use std::time::Duration;

use crate::config::RetryConfig;

/// Limits applied to every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Same-backend retries before the backend is marked dead.
    pub max_retries: u32,
    /// Distinct backends a request may try.
    pub max_attempts: u32,
    /// Pause before each same-backend retry.
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            max_attempts: 3,
            retry_delay: Duration::from_millis(10),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            max_attempts: config.max_attempts,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        }
    }
}

/// What to do after a failed delegate call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Wait, then call the same backend again.
    RetrySame,
    /// Mark the backend dead and pick another one.
    Failover,
}

/// Counters for one inbound request. Never shared between requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryState {
    attempts: u32,
    retries: u32,
}

impl Default for RetryState {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryState {
    /// State for a request about to be forwarded for the first time.
    pub fn new() -> Self {
        Self {
            attempts: 1,
            retries: 0,
        }
    }

    /// Distinct backends tried so far, counting the current one.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Retries spent against the current backend.
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Whether the request may still be sent to another backend.
    pub fn attempts_exhausted(&self, policy: &RetryPolicy) -> bool {
        self.attempts > policy.max_attempts
    }

    /// Record a failed call against the current backend and decide what follows.
    pub fn on_failure(&mut self, policy: &RetryPolicy) -> Decision {
        if self.retries < policy.max_retries {
            self.retries += 1;
            Decision::RetrySame
        } else {
            self.escalate();
            Decision::Failover
        }
    }

    /// Move on to a new backend.
    fn escalate(&mut self) {
        self.attempts += 1;
        self.retries = 0;
    }
}
