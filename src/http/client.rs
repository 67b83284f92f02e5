//! Outbound forwarding to a single backend.
//!
//! # Responsibilities
//! - Own the shared hyper client used for proxying and probing
//! - Bind a forwarding delegate to one backend address
//! - Report transport failures as errors, never as responses
//!
//! # Design Decisions
//! - An error is only returned before response headers arrive; once a
//!   response exists it is handed back as-is and nothing can restart it
//! - Each call is bounded by its own timeout

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use futures_util::future::BoxFuture;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;
use url::Url;

use crate::http::{request::target_uri, response::from_upstream};

/// Shared outbound client.
pub type HttpClient = Client<HttpConnector, Body>;

/// Build the outbound client with a bounded connect phase.
pub fn build_client(connect_timeout: Duration) -> HttpClient {
    let mut connector = HttpConnector::new();
    connector.set_connect_timeout(Some(connect_timeout));
    connector.set_nodelay(true);
    Client::builder(TokioExecutor::new()).build(connector)
}

/// Why a delegate call failed.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// Connection refused/reset, or the backend hung up before responding.
    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),

    /// No response headers within the per-call timeout.
    #[error("upstream request timed out after {0:?}")]
    Timeout(Duration),

    /// The request could not be addressed to the backend.
    #[error("failed to build upstream request: {0}")]
    Request(#[from] axum::http::Error),
}

/// The delegate that performs the actual proxy call to one backend.
pub trait Forward: Send + Sync {
    fn forward(&self, request: Request<Body>) -> BoxFuture<'_, Result<Response<Body>, ForwardError>>;
}

/// Forwards requests to a fixed backend URL over HTTP.
#[derive(Clone)]
pub struct HttpForwarder {
    target: Url,
    client: HttpClient,
    timeout: Duration,
}

impl HttpForwarder {
    pub fn new(target: Url, client: HttpClient, timeout: Duration) -> Self {
        Self {
            target,
            client,
            timeout,
        }
    }

    async fn call(&self, mut request: Request<Body>) -> Result<Response<Body>, ForwardError> {
        *request.uri_mut() = target_uri(&self.target, request.uri())?;

        match tokio::time::timeout(self.timeout, self.client.request(request)).await {
            Ok(Ok(response)) => Ok(from_upstream(response)),
            Ok(Err(e)) => Err(ForwardError::Upstream(e)),
            Err(_) => Err(ForwardError::Timeout(self.timeout)),
        }
    }
}

impl Forward for HttpForwarder {
    fn forward(&self, request: Request<Body>) -> BoxFuture<'_, Result<Response<Body>, ForwardError>> {
        Box::pin(self.call(request))
    }
}
