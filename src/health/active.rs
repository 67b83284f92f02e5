//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe every backend with a HEAD request
//! - Update backend liveness from each probe's outcome
//! - Stop when the shutdown signal fires

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, Uri};
use futures_util::future::join_all;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::HealthCheckConfig;
use crate::http::client::HttpClient;
use crate::http::request::target_uri;
use crate::load_balancer::{Backend, BackendPool};
use crate::observability::metrics;

pub struct HealthMonitor {
    pool: Arc<BackendPool>,
    config: HealthCheckConfig,
    client: HttpClient,
}

impl HealthMonitor {
    pub fn new(pool: Arc<BackendPool>, config: HealthCheckConfig, client: HttpClient) -> Self {
        Self {
            pool,
            config,
            client,
        }
    }

    /// Run the monitor on its own task until `shutdown` fires.
    pub fn spawn(self, shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.enabled {
            tracing::info!("Active health checks disabled");
            return;
        }

        tracing::info!(
            interval = self.config.interval_secs,
            timeout = self.config.timeout_secs,
            path = %self.config.path,
            "Health monitor starting"
        );

        // First round fires one full interval after startup, like every later one.
        let interval = Duration::from_secs(self.config.interval_secs);
        let mut ticker = time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.check_all().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Probe every backend once, concurrently, and record the results.
    pub async fn check_all(&self) {
        tracing::debug!("Starting health check");

        let probes = self.pool.backends().iter().map(|backend| async move {
            let alive = self.probe(backend).await;
            let was_alive = backend.set_alive(alive);
            if was_alive != alive {
                let status = if alive { "up" } else { "down" };
                tracing::info!(backend = %backend.url(), status, "Backend liveness changed");
            }
            metrics::record_backend_health(backend.url().as_str(), alive);
            alive
        });
        let results = join_all(probes).await;

        tracing::debug!(
            alive = results.iter().filter(|alive| **alive).count(),
            total = results.len(),
            "Health check completed"
        );
    }

    /// One HEAD request; alive only on a 2xx within the timeout.
    async fn probe(&self, backend: &Backend) -> bool {
        let url = backend.url();
        let path: Uri = match self.config.path.parse() {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(path = %self.config.path, error = %e, "Invalid health check path");
                return false;
            }
        };

        let request = match target_uri(url, &path).and_then(|uri| {
            Request::builder()
                .method(Method::HEAD)
                .uri(uri)
                .header("user-agent", "lb-proxy-health-check")
                .body(Body::empty())
        }) {
            Ok(req) => req,
            Err(e) => {
                tracing::error!(backend = %url, error = %e, "Failed to build health check request");
                return false;
            }
        };

        let timeout = Duration::from_secs(self.config.timeout_secs);
        match time::timeout(timeout, self.client.request(request)).await {
            Ok(Ok(response)) => {
                let success = response.status().is_success();
                if !success {
                    tracing::warn!(backend = %url, status = %response.status(), "Health check failed: non-success status");
                }
                success
            }
            Ok(Err(e)) => {
                tracing::warn!(backend = %url, error = %e, "Health check failed: connection error");
                false
            }
            Err(_) => {
                tracing::warn!(backend = %url, "Health check failed: timeout");
                false
            }
        }
    }
}
