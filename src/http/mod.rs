//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (hyper connection, Axum router)
//!     → [route table resolves path] (routing)
//!     → forwarder.rs (outbound request, upstream call, relayed response)
//!     → headers.rs (hop-by-hop stripping, X-Forwarded-*, CORS)
//!     → Send to client, append LogEntry
//! ```

pub mod forwarder;
pub mod headers;
pub mod server;

pub use forwarder::{Exchange, Forwarder, Outcome};
pub use server::{ProxyServer, ProxyState};
