//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single backend server
//! - Track liveness (alive/dead) under a reader/writer lock
//! - Hold the forwarding delegate bound to the backend's address

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use axum::body::Body;
use axum::http::{Request, Response};
use futures_util::future::BoxFuture;
use url::Url;

use crate::http::client::{Forward, ForwardError};

/// A single backend server.
///
/// The address and delegate are fixed at construction; liveness is the only
/// mutable state. Every request reads it, so reads share the lock and only
/// health transitions take it exclusively.
pub struct Backend {
    url: Url,
    alive: RwLock<bool>,
    delegate: Arc<dyn Forward>,
}

impl Backend {
    /// Create a new backend. Backends start alive.
    pub fn new(url: Url, delegate: Arc<dyn Forward>) -> Self {
        Self {
            url,
            alive: RwLock::new(true),
            delegate,
        }
    }

    /// The backend's address.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Whether the backend is eligible for selection.
    pub fn is_alive(&self) -> bool {
        *self.alive.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set liveness, returning the previous value.
    pub fn set_alive(&self, alive: bool) -> bool {
        let mut guard = self.alive.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, alive)
    }

    /// Hand a request to this backend's delegate.
    pub fn forward(&self, request: Request<Body>) -> BoxFuture<'_, Result<Response<Body>, ForwardError>> {
        self.delegate.forward(request)
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend")
            .field("url", &self.url.as_str())
            .field("alive", &self.is_alive())
            .finish()
    }
}
