//! Data-plane HTTP server.
//!
//! # Responsibilities
//! - Create the Axum Router that sends every path to the proxy handler
//! - Accept connections on the bounded listener
//! - Serve HTTP/1.1 and HTTP/2 per connection
//! - Wire requests through route table → forwarder → log store
//! - Abort in-flight connections when stopped

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    routing::any,
    Router,
};
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::conn::auto::Builder,
    service::TowerToHyperService,
};
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tower_http::trace::TraceLayer;

use crate::capture::LogStore;
use crate::http::forwarder::{self, Forwarder};
use crate::net::listener::{Listener, ListenerError};
use crate::observability::metrics;
use crate::routing::RouteTable;

/// Shared state injected into the proxy handler.
#[derive(Clone)]
pub struct ProxyState {
    pub routes: Arc<RouteTable>,
    pub logs: Arc<LogStore>,
    pub forwarder: Forwarder,
}

/// Build the data-plane router: every method and path goes to the proxy handler.
pub fn build_router(state: ProxyState) -> Router {
    Router::new()
        .route("/{*path}", any(proxy_handler))
        .route("/", any(proxy_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Main proxy handler.
/// Resolves the route, forwards the request and records the exchange.
async fn proxy_handler(State(state): State<ProxyState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let exchange = match state.routes.resolve(&path) {
        Some(route) => state.forwarder.forward(request, &route).await,
        None => {
            tracing::warn!(method = %method, path = %path, "No route matched");
            forwarder::not_found(&request, start_time)
        }
    };

    tracing::info!(
        method = %method,
        path = %path,
        target = %exchange.entry.target_url,
        status = exchange.entry.status,
        duration_ms = exchange.entry.duration,
        "Proxied request"
    );
    metrics::record_request(
        &method,
        exchange.entry.status,
        exchange.outcome.as_str(),
        start_time,
    );

    state.logs.append(exchange.entry);
    exchange.response
}

/// A bound data-plane server, ready to run.
pub struct ProxyServer {
    router: Router,
    listener: Listener,
}

impl ProxyServer {
    /// Bind the listening socket. Failure leaves nothing running.
    pub async fn bind(
        addr: SocketAddr,
        max_connections: usize,
        state: ProxyState,
    ) -> Result<Self, ListenerError> {
        let listener = Listener::bind(addr, max_connections).await?;
        Ok(Self {
            router: build_router(state),
            listener,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.listener.local_addr()
    }

    /// Accept connections until `shutdown` fires, then drop the socket and
    /// abort every in-flight connection.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let service = TowerToHyperService::new(self.router);
        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer_addr, permit)) => {
                        tracing::debug!(
                            peer_addr = %peer_addr,
                            available_permits = self.listener.available_permits(),
                            "Connection accepted"
                        );
                        let service = service.clone();
                        connections.spawn(async move {
                            let _permit = permit;
                            let builder = Builder::new(TokioExecutor::new());
                            if let Err(e) = builder.serve_connection(TokioIo::new(stream), service).await {
                                tracing::debug!(peer_addr = %peer_addr, error = %e, "Connection ended with error");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to accept connection");
                    }
                },
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
            }
        }

        let in_flight = connections.len();
        connections.abort_all();
        tracing::info!(in_flight, "Proxy listener closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    fn state() -> ProxyState {
        ProxyState {
            routes: Arc::new(RouteTable::default()),
            logs: Arc::new(LogStore::default()),
            forwarder: Forwarder::new(100_000).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_no_routes_is_not_found_and_logged() {
        let state = state();
        let router = build_router(state.clone());

        let response = router
            .oneshot(Request::builder().uri("/anything").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "No matching route for path: /anything");

        let logs = state.logs.list();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, 404);
        assert_eq!(logs[0].route_id, "");
        assert_eq!(logs[0].target_url, "");
    }

    #[tokio::test]
    async fn test_disabled_route_is_not_found() {
        let state = state();
        let route = state.routes.add("/svc", "http://127.0.0.1:9").unwrap();
        state.routes.toggle(&route.id).unwrap();

        let response = build_router(state.clone())
            .oneshot(Request::builder().uri("/svc/x").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_bind_reports_port_in_use() {
        let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap();

        let result = ProxyServer::bind(addr, 10, state()).await;
        assert!(matches!(result, Err(ListenerError::Bind(_))));
    }
}
