//! Passive health checking (failure detection).
//!
//! A backend that keeps failing after its same-backend retries is marked dead
//! by the request that observed it. Only transport failures count; backend
//! responses of any status never reach here.

use crate::http::client::ForwardError;
use crate::load_balancer::Backend;
use crate::observability::metrics;

/// Mark a backend dead after its retries were exhausted by a live request.
pub fn report_exhausted(backend: &Backend, error: &ForwardError) {
    let was_alive = backend.set_alive(false);
    if was_alive {
        tracing::warn!(backend = %backend.url(), error = %error, "Backend marked dead after repeated failures");
        metrics::record_backend_health(backend.url().as_str(), false);
    }
}
