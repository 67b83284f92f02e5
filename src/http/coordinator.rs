//! Forwarding coordinator.
//!
//! # Data Flow
//! ```text
//! attempts > max_attempts? ── yes ──▶ AttemptsExhausted (503)
//!     │ no
//!     ▼
//! pool.next_peer() ── none ──▶ NoPeer (503)
//!     │ peer
//!     ▼
//! delegate call ── ok ──▶ Forwarded (pass-through)
//!     │ error
//!     ▼
//! retries < max_retries? ── yes ──▶ sleep(retry_delay), same peer again
//!     │ no
//!     ▼
//! mark peer dead, attempts += 1, back to the top
//! ```
//!
//! Dropping the returned future (client went away) abandons any in-flight
//! delegate call or pending retry delay; nothing further is escalated.

use std::sync::Arc;

use axum::body::Body;
use axum::http::Response;

use crate::health::passive;
use crate::http::client::ForwardError;
use crate::http::request::BufferedRequest;
use crate::http::response::{service_unavailable, ATTEMPTS_EXHAUSTED_BODY, NO_PEER_BODY};
use crate::load_balancer::{Backend, BackendPool};
use crate::observability::metrics;
use crate::resilience::retries::{Decision, RetryPolicy, RetryState};

/// How a request left the coordinator.
#[derive(Debug)]
pub enum Outcome {
    /// A backend answered; its response is passed through.
    Forwarded {
        backend: Arc<Backend>,
        response: Response<Body>,
    },
    /// Every backend was dead when a peer was needed.
    NoPeer,
    /// The request already tried `max_attempts` distinct backends.
    AttemptsExhausted,
}

impl Outcome {
    /// Backend label for metrics.
    pub fn backend_label(&self) -> String {
        match self {
            Outcome::Forwarded { backend, .. } => backend.url().to_string(),
            Outcome::NoPeer | Outcome::AttemptsExhausted => "none".to_string(),
        }
    }

    pub fn into_response(self) -> Response<Body> {
        match self {
            Outcome::Forwarded { response, .. } => response,
            Outcome::NoPeer => service_unavailable(NO_PEER_BODY),
            Outcome::AttemptsExhausted => service_unavailable(ATTEMPTS_EXHAUSTED_BODY),
        }
    }
}

/// Selects peers, delegates requests, and handles retry and failover.
#[derive(Debug, Clone)]
pub struct Coordinator {
    pool: Arc<BackendPool>,
    policy: RetryPolicy,
}

impl Coordinator {
    pub fn new(pool: Arc<BackendPool>, policy: RetryPolicy) -> Self {
        Self { pool, policy }
    }

    /// Forward one inbound request until a backend answers or a terminal condition is hit.
    pub async fn forward(&self, request: &BufferedRequest, request_id: &str) -> Outcome {
        let path = request.uri().path();
        let mut state = RetryState::new();
        let mut failed_over = false;

        loop {
            if state.attempts_exhausted(&self.policy) {
                tracing::warn!(request_id, path, attempts = state.attempts(), "Max attempts reached, terminating");
                return Outcome::AttemptsExhausted;
            }

            let Some(peer) = self.pool.next_peer() else {
                tracing::warn!(request_id, path, attempts = state.attempts(), "No alive peer available");
                return Outcome::NoPeer;
            };
            if failed_over {
                metrics::record_failover();
            }

            match self.forward_to(&peer, request, &mut state, request_id).await {
                Ok(response) => {
                    tracing::debug!(
                        request_id,
                        path,
                        backend = %peer.url(),
                        status = %response.status(),
                        "Forwarded request"
                    );
                    return Outcome::Forwarded {
                        backend: peer,
                        response,
                    };
                }
                Err(error) => {
                    passive::report_exhausted(&peer, &error);
                    failed_over = true;
                    tracing::info!(request_id, path, attempt = state.attempts(), "Attempting next backend");
                }
            }
        }
    }

    /// Call one backend, retrying in place until the policy says to fail over.
    async fn forward_to(
        &self,
        peer: &Backend,
        request: &BufferedRequest,
        state: &mut RetryState,
        request_id: &str,
    ) -> Result<Response<Body>, ForwardError> {
        loop {
            let error = match peer.forward(request.to_request()).await {
                Ok(response) => return Ok(response),
                Err(error) => error,
            };
            tracing::warn!(request_id, backend = %peer.url(), error = %error, "Proxy error");

            match state.on_failure(&self.policy) {
                Decision::RetrySame => {
                    tracing::info!(request_id, backend = %peer.url(), retry = state.retries(), "Retrying backend");
                    metrics::record_retry(peer.url().as_str());
                    tokio::time::sleep(self.policy.retry_delay).await;
                }
                Decision::Failover => return Err(error),
            }
        }
    }
}
