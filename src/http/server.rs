//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all proxy handler
//! - Wire up middleware (tracing, request ID)
//! - Bind server to listener
//! - Buffer the inbound request and hand it to the coordinator
//! - Own the health monitor task and stop it on shutdown

use std::error::Error as _;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::{Body, Bytes},
    extract::{ConnectInfo, State},
    http::{HeaderName, Request, Response},
    routing::any,
    Router,
};
use http_body_util::LengthLimitError;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::health::HealthMonitor;
use crate::http::client::{build_client, HttpClient};
use crate::http::coordinator::Coordinator;
use crate::http::request::BufferedRequest;
use crate::http::response::{bad_request, payload_too_large};
use crate::lifecycle::Shutdown;
use crate::load_balancer::{BackendPool, PoolError};
use crate::observability::metrics;
use crate::resilience::retries::RetryPolicy;

const X_REQUEST_ID: &str = "x-request-id";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Coordinator,
    pub max_body_bytes: usize,
}

/// HTTP front end of the load balancer.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    pool: Arc<BackendPool>,
    client: HttpClient,
}

impl HttpServer {
    /// Build the backend pool from configuration and the server around it.
    pub fn new(config: ProxyConfig) -> Result<Self, PoolError> {
        let client = build_client(Duration::from_secs(config.timeouts.connect_secs));
        let pool = Arc::new(BackendPool::with_client(&config, client.clone())?);
        Ok(Self::with_pool(config, pool, client))
    }

    /// Build the server around an existing pool.
    pub fn with_pool(config: ProxyConfig, pool: Arc<BackendPool>, client: HttpClient) -> Self {
        let state = AppState {
            coordinator: Coordinator::new(pool.clone(), RetryPolicy::from(&config.retries)),
            max_body_bytes: config.listener.max_body_bytes,
        };

        Self {
            router: Self::build_router(state),
            config,
            pool,
            client,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        let request_id = HeaderName::from_static(X_REQUEST_ID);

        Router::new()
            .route("/", any(proxy_handler))
            .route("/{*path}", any(proxy_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::new(request_id)),
            )
    }

    /// Shared handle to the backend pool.
    pub fn pool(&self) -> Arc<BackendPool> {
        self.pool.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Serve until `shutdown` fires, then stop the health monitor and return.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, backends = self.pool.len(), "Load balancer running");

        let monitor = HealthMonitor::new(
            self.pool.clone(),
            self.config.health_check.clone(),
            self.client.clone(),
        )
        .spawn(shutdown.subscribe());

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        let mut stop = shutdown.subscribe();
        let served = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = stop.recv().await;
            })
            .await;

        // Serving may also end on an I/O error; the monitor must not outlive it.
        shutdown.trigger();
        if let Err(e) = monitor.await {
            tracing::error!(error = %e, "Health monitor task failed");
        }

        tracing::info!("HTTP server stopped");
        served
    }
}

/// Catch-all proxy handler.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response<Body> {
    let start_time = Instant::now();
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();
    let client_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let (parts, body) = request.into_parts();
    let body = match buffer_body(body, state.max_body_bytes, &request_id).await {
        Ok(bytes) => bytes,
        Err(response) => {
            metrics::record_request(response.status().as_u16(), "none", start_time);
            return response;
        }
    };

    let request = BufferedRequest::new(parts, body, client_addr);
    tracing::debug!(
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
        "Proxying request"
    );

    let outcome = state.coordinator.forward(&request, &request_id).await;
    let backend = outcome.backend_label();
    let response = outcome.into_response();
    metrics::record_request(response.status().as_u16(), &backend, start_time);
    response
}

/// Read the whole body: 413 past `limit`, 400 when the client stream fails.
async fn buffer_body(body: Body, limit: usize, request_id: &str) -> Result<Bytes, Response<Body>> {
    let error = match axum::body::to_bytes(body, limit).await {
        Ok(bytes) => return Ok(bytes),
        Err(e) => e,
    };

    let mut source = error.source();
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            tracing::warn!(request_id, limit, "Request body too large");
            return Err(payload_too_large());
        }
        source = e.source();
    }

    tracing::warn!(request_id, error = %error, "Failed to read request body");
    Err(bad_request())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    use crate::http::response::NO_PEER_BODY;

    #[tokio::test]
    async fn test_no_peer_returns_503_with_request_id() {
        let server = HttpServer::new(ProxyConfig::default()).unwrap();
        for b in server.pool().backends() {
            b.set_alive(false);
        }

        let response = server
            .router
            .clone()
            .oneshot(Request::builder().uri("/any/path").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(response.headers().contains_key(X_REQUEST_ID));
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], NO_PEER_BODY.as_bytes());
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let mut config = ProxyConfig::default();
        config.listener.max_body_bytes = 4;
        let server = HttpServer::new(config).unwrap();

        let response = server
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/upload")
                    .body(Body::from("too many bytes"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(server.pool().alive_count(), 5);
    }

    #[tokio::test]
    async fn test_aborted_body_rejected() {
        let server = HttpServer::new(ProxyConfig::default()).unwrap();
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"partial")),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "client went away")),
        ];

        let response = server
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/upload")
                    .body(Body::from_stream(futures_util::stream::iter(chunks)))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(server.pool().alive_count(), 5);
    }
}
