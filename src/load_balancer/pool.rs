//! Backend pool management.
//!
//! # Responsibilities
//! - Own the fixed, ordered set of backends built at startup
//! - Select the next alive peer via round robin
//! - Expose the backends to the health monitor

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::config::{validation::check_backend, ProxyConfig, ValidationError};
use crate::http::client::{build_client, HttpClient, HttpForwarder};
use crate::load_balancer::{backend::Backend, round_robin::RoundRobin};
use crate::observability::metrics;

/// Errors building a pool.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("backend pool requires at least one backend")]
    Empty,

    #[error(transparent)]
    InvalidAddress(#[from] ValidationError),
}

/// The process-wide set of backends and its rotation cursor.
#[derive(Debug)]
pub struct BackendPool {
    backends: Vec<Arc<Backend>>,
    selector: RoundRobin,
}

impl BackendPool {
    /// Create a pool from already-constructed backends.
    pub fn new(backends: Vec<Arc<Backend>>) -> Result<Self, PoolError> {
        if backends.is_empty() {
            return Err(PoolError::Empty);
        }
        for backend in &backends {
            metrics::record_backend_health(backend.url().as_str(), backend.is_alive());
        }
        Ok(Self {
            backends,
            selector: RoundRobin::new(),
        })
    }

    /// Build HTTP backends from configuration, sharing one outbound client.
    pub fn from_config(config: &ProxyConfig) -> Result<Self, PoolError> {
        let client = build_client(Duration::from_secs(config.timeouts.connect_secs));
        Self::with_client(config, client)
    }

    /// Build HTTP backends from configuration using the given client.
    pub fn with_client(config: &ProxyConfig, client: HttpClient) -> Result<Self, PoolError> {
        let forward_timeout = Duration::from_secs(config.timeouts.forward_secs);

        let backends = config
            .backends
            .iter()
            .map(|address| -> Result<Arc<Backend>, PoolError> {
                let url = check_backend(address)?;
                tracing::info!(backend = %url, "Configured backend");
                let delegate = HttpForwarder::new(url.clone(), client.clone(), forward_timeout);
                Ok(Arc::new(Backend::new(url, Arc::new(delegate))))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(backends)
    }

    /// Select the next alive backend, or `None` when every backend is dead.
    pub fn next_peer(&self) -> Option<Arc<Backend>> {
        let peer = self.selector.select(&self.backends).cloned();
        if peer.is_none() {
            tracing::debug!(backend_count = self.backends.len(), "No alive backends in pool");
            for b in &self.backends {
                tracing::debug!(backend = %b.url(), alive = b.is_alive(), "Backend status");
            }
        }
        peer
    }

    /// All backends in configured order (for health checking).
    pub fn backends(&self) -> &[Arc<Backend>] {
        &self.backends
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Number of backends currently alive.
    pub fn alive_count(&self) -> usize {
        self.backends.iter().filter(|b| b.is_alive()).count()
    }

    /// Current rotation cursor.
    pub fn cursor(&self) -> u64 {
        self.selector.cursor()
    }
}
