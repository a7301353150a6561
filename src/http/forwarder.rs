//! Request forwarding to upstream targets.
//!
//! # Responsibilities
//! - Build the outbound request from the inbound one and the matched route
//! - Perform the upstream call (no retries, no timeout)
//! - Build the relayed response and the captured log entry
//!
//! # Design Decisions
//! - Bodies are fully buffered in both directions for inspection
//! - The relayed body is never truncated; only the captured copy is
//! - Redirects are relayed to the caller, not followed
//! - Status code and reason phrase pass through verbatim

use std::time::Instant;

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, Method, Request, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use hyper::ext::ReasonPhrase;
use serde_json::json;

use crate::capture::body::{capture_request_body, capture_response_body};
use crate::capture::entry::snapshot_headers;
use crate::capture::LogEntry;
use crate::error::ForwardError;
use crate::http::headers::{apply_forwarded, relay_response_headers, strip_hop_by_hop};
use crate::routing::{build_target_url, Route};

/// How a proxied request ended, used as a metrics label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Relayed,
    NoRoute,
    UpstreamError,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Relayed => "relayed",
            Outcome::NoRoute => "no_route",
            Outcome::UpstreamError => "upstream_error",
        }
    }
}

/// Result of handling one inbound request: what to send back and what to log.
pub struct Exchange {
    pub response: Response,
    pub entry: LogEntry,
    pub outcome: Outcome,
}

struct UpstreamReply {
    status: StatusCode,
    reason: Option<ReasonPhrase>,
    headers: HeaderMap,
    body: Bytes,
}

/// Forwards inbound requests to the upstream chosen by the route table.
#[derive(Clone)]
pub struct Forwarder {
    client: reqwest::Client,
    body_limit: usize,
}

impl Forwarder {
    /// Create a forwarder whose log capture keeps bodies under `body_limit` bytes.
    pub fn new(body_limit: usize) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(upstream_client()?, body_limit))
    }

    pub fn with_client(client: reqwest::Client, body_limit: usize) -> Self {
        Self { client, body_limit }
    }

    /// Relay `request` to the target of `route`.
    pub async fn forward(&self, request: Request<Body>, route: &Route) -> Exchange {
        let started = Instant::now();
        let (parts, body) = request.into_parts();
        let path = parts.uri.path().to_string();

        let mut entry = LogEntry::begin(parts.method.as_str(), path.as_str(), &parts.headers);
        entry.route_id = route.id.clone();
        entry.target_url = build_target_url(route, &path);
        entry.query = parts.uri.query().map(str::to_string);
        let target = entry.full_target_url();

        let mut headers = strip_hop_by_hop(&parts.headers);
        let host = parts
            .headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .or_else(|| parts.uri.authority().map(|a| a.as_str()));
        apply_forwarded(&mut headers, parts.uri.scheme_str().unwrap_or("http"), host);

        tracing::debug!(
            method = %parts.method,
            path = %path,
            target = %target,
            route_id = %route.id,
            "Forwarding request"
        );

        match self
            .relay(parts.method.clone(), &target, headers, body, &mut entry)
            .await
        {
            Ok(reply) => {
                entry.response_headers = Some(snapshot_headers(&reply.headers));
                let content_type = reply
                    .headers
                    .get(header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok());
                entry.response_body = Some(capture_response_body(
                    &reply.body,
                    content_type,
                    self.body_limit,
                ));
                let entry = entry.finish(reply.status.as_u16(), started);

                let headers = relay_response_headers(&reply.headers);
                let mut response = (reply.status, headers, reply.body).into_response();
                // Non-canonical reason phrases are written back out by the HTTP/1 server.
                if let Some(reason) = reply.reason {
                    response.extensions_mut().insert(reason);
                }
                Exchange {
                    response,
                    entry,
                    outcome: Outcome::Relayed,
                }
            }
            Err(e) => {
                tracing::warn!(target = %target, error = %e, "Upstream request failed");
                let entry = entry.finish(StatusCode::BAD_GATEWAY.as_u16(), started);
                let body = Json(json!({ "error": format!("Proxy error: {}", e) }));
                Exchange {
                    response: (StatusCode::BAD_GATEWAY, body).into_response(),
                    entry,
                    outcome: Outcome::UpstreamError,
                }
            }
        }
    }

    async fn relay(
        &self,
        method: Method,
        target: &str,
        headers: HeaderMap,
        body: Body,
        entry: &mut LogEntry,
    ) -> Result<UpstreamReply, ForwardError> {
        let mut builder = self.client.request(method.clone(), target).headers(headers);

        if !has_no_body(&method) {
            let bytes = axum::body::to_bytes(body, usize::MAX)
                .await
                .map_err(|e| ForwardError::RequestBody(e.to_string()))?;
            entry.request_body = Some(capture_request_body(&bytes, self.body_limit));
            builder = builder.body(bytes);
        }

        let response = builder.send().await?;
        let status = response.status();
        let reason = response.extensions().get::<ReasonPhrase>().cloned();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(UpstreamReply {
            status,
            reason,
            headers,
            body,
        })
    }
}

/// Answer a request no route matched: 404 with a JSON error, logged without target.
pub fn not_found(request: &Request<Body>, started: Instant) -> Exchange {
    let path = request.uri().path();
    let entry = LogEntry::begin(request.method().as_str(), path, request.headers())
        .finish(StatusCode::NOT_FOUND.as_u16(), started);
    let body = Json(json!({ "error": format!("No matching route for path: {}", path) }));

    Exchange {
        response: (StatusCode::NOT_FOUND, body).into_response(),
        entry,
        outcome: Outcome::NoRoute,
    }
}

/// GET and HEAD requests are forwarded without reading the inbound body.
pub fn has_no_body(method: &Method) -> bool {
    method == Method::GET || method == Method::HEAD
}

/// HTTP client for upstream calls: no redirects followed, no environment proxies.
pub fn upstream_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_exchange() {
        let request = Request::builder()
            .method("GET")
            .uri("/anything?q=1")
            .header("accept", "*/*")
            .body(Body::empty())
            .unwrap();

        let exchange = not_found(&request, Instant::now());
        assert_eq!(exchange.response.status(), StatusCode::NOT_FOUND);
        assert_eq!(exchange.outcome, Outcome::NoRoute);
        assert_eq!(exchange.entry.status, 404);
        assert_eq!(exchange.entry.path, "/anything");
        assert_eq!(exchange.entry.route_id, "");
        assert_eq!(exchange.entry.target_url, "");
        assert_eq!(exchange.entry.request_headers.as_ref().unwrap()["accept"], "*/*");
        assert!(exchange.entry.response_headers.is_none());
    }

    #[test]
    fn test_bodyless_methods() {
        assert!(has_no_body(&Method::GET));
        assert!(has_no_body(&Method::HEAD));
        assert!(!has_no_body(&Method::POST));
        assert!(!has_no_body(&Method::DELETE));
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_bad_gateway() {
        let forwarder = Forwarder::new(100_000).unwrap();
        // Port 9 (discard) on loopback is not expected to accept connections.
        let route = Route::new("r1", "/svc", "http://127.0.0.1:9").unwrap();
        let request = Request::builder()
            .method("POST")
            .uri("/svc/items")
            .body(Body::from("payload"))
            .unwrap();

        let exchange = forwarder.forward(request, &route).await;
        assert_eq!(exchange.response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(exchange.outcome, Outcome::UpstreamError);
        assert_eq!(exchange.entry.status, 502);
        assert_eq!(exchange.entry.route_id, "r1");
        assert_eq!(exchange.entry.target_url, "http://127.0.0.1:9/items");
        assert_eq!(exchange.entry.request_body.as_deref(), Some("payload"));
        assert!(exchange.entry.response_headers.is_none());
        assert!(exchange.entry.response_body.is_none());
    }
}
