//! Request handling and transformation.
//!
//! # Responsibilities
//! - Buffer the inbound request so it can be replayed on retry and failover
//! - Strip hop-by-hop headers and append `X-Forwarded-For`
//! - Rewrite the request URI onto a backend's address
//!
//! # Design Decisions
//! - Method, path, query, remaining headers and body are forwarded unmodified
//! - The inbound `Host` header is preserved
//! - Each replay produces a fresh `Request<Body>` from the same buffered bytes

use std::net::SocketAddr;

use axum::body::{Body, Bytes};
use axum::http::{
    header::{self, HeaderMap, HeaderName, HeaderValue},
    request::Parts,
    Method, Request, Uri,
};
use url::Url;

/// Hop-by-hop headers never forwarded in either direction.
const HOP_BY_HOP: [&str; 9] = [
    "connection",
    "keep-alive",
    "proxy-connection",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// An inbound request with its body fully read, ready to be forwarded any number of times.
#[derive(Debug, Clone)]
pub struct BufferedRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
}

impl BufferedRequest {
    /// Build from the inbound request head and its collected body.
    pub fn new(parts: Parts, body: Bytes, client_addr: Option<SocketAddr>) -> Self {
        let mut headers = parts.headers;
        strip_hop_by_hop(&mut headers);
        if let Some(addr) = client_addr {
            append_forwarded_for(&mut headers, addr);
        }

        Self {
            method: parts.method,
            uri: parts.uri,
            headers,
            body,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Produce a fresh HTTP/1.1 request for one delegate call.
    pub fn to_request(&self) -> Request<Body> {
        let mut request = Request::new(Body::from(self.body.clone()));
        *request.method_mut() = self.method.clone();
        *request.uri_mut() = self.uri.clone();
        *request.headers_mut() = self.headers.clone();
        request
    }
}

/// Remove hop-by-hop headers, including any listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}

fn append_forwarded_for(headers: &mut HeaderMap, addr: SocketAddr) {
    let client_ip = addr.ip().to_string();
    let value = match headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        Some(prior) => format!("{}, {}", prior, client_ip),
        None => client_ip,
    };
    if let Ok(value) = HeaderValue::from_str(&value) {
        headers.insert("x-forwarded-for", value);
    }
}

/// Point an inbound URI at `target`, joining paths with a single slash and merging queries.
pub fn target_uri(target: &Url, inbound: &Uri) -> Result<Uri, axum::http::Error> {
    let path = join_paths(target.path(), inbound.path());
    let path_and_query = match (target.query().filter(|q| !q.is_empty()), inbound.query()) {
        (Some(t), Some(i)) if !i.is_empty() => format!("{}?{}&{}", path, t, i),
        (Some(t), _) => format!("{}?{}", path, t),
        (None, Some(i)) => format!("{}?{}", path, i),
        (None, None) => path,
    };

    let host = target.host_str().unwrap_or_default();
    let authority = match target.port_or_known_default() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };

    Uri::builder()
        .scheme(target.scheme())
        .authority(authority)
        .path_and_query(path_and_query)
        .build()
}

fn join_paths(base: &str, tail: &str) -> String {
    match (base.ends_with('/'), tail.starts_with('/')) {
        (true, true) => format!("{}{}", base, &tail[1..]),
        (false, false) => format!("{}/{}", base, tail),
        _ => format!("{}{}", base, tail),
    }
}
