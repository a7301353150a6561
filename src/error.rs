//! Error types for the control surface, the data plane and replay.
//!
//! Control errors are returned synchronously to whoever drove the operation
//! and are never recorded as proxied exchanges. Forward errors become a 502
//! for the proxied client. Replay errors only reach the control caller.

use std::net::SocketAddr;

use crate::net::listener::ListenerError;

/// Failures of the control operations (port, routes, start/stop).
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("Proxy is already running")]
    AlreadyRunning,

    #[error("Proxy is not running")]
    NotRunning,

    #[error("Add at least one route before starting")]
    NoRoutes,

    #[error("Stop the proxy before changing port")]
    PortWhileRunning,

    #[error("Port must be between 1 and 65535")]
    InvalidPort,

    #[error("Path prefix must start with /")]
    InvalidPathPrefix,

    #[error("Target URL must start with http:// or https://")]
    InvalidTargetUrl,

    #[error("Route not found")]
    RouteNotFound,

    /// The listening socket could not be bound (port in use, permission denied).
    #[error("Could not listen on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: ListenerError,
    },
}

/// Failures while relaying a request to its upstream target.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    /// The inbound request body could not be read.
    #[error("failed to read request body: {0}")]
    RequestBody(String),

    /// Connect, DNS or transfer failure talking to the upstream.
    #[error("{0}")]
    Upstream(#[from] reqwest::Error),
}

/// Failures of a replay request.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("Log entry not found")]
    LogNotFound,

    /// The captured request cannot be rebuilt (e.g. unknown method token).
    #[error("Invalid captured request: {0}")]
    InvalidRequest(String),

    #[error("{0}")]
    Upstream(#[from] reqwest::Error),
}
