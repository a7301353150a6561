//! Control API.
//!
//! Exposes the engine's control operations as JSON over HTTP. Every
//! response is an envelope with `success` and, on failure, `error`.

pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use self::handlers::*;
use crate::engine::ProxyEngine;

pub fn setup_admin_router(engine: Arc<ProxyEngine>) -> Router {
    Router::new()
        .route("/api/proxy/status", get(get_status))
        .route("/api/proxy/port", post(set_port))
        .route(
            "/api/proxy/route",
            post(add_route).put(edit_route).delete(remove_route),
        )
        .route("/api/proxy/route/toggle", post(toggle_route))
        .route("/api/proxy/start", post(start_proxy))
        .route("/api/proxy/stop", post(stop_proxy))
        .route("/api/proxy/logs/clear", post(clear_logs))
        .route("/api/proxy/repeat", post(repeat_request))
        .with_state(engine)
        .layer(TraceLayer::new_for_http())
}
