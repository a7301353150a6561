//! Exchange capture subsystem.
//!
//! # Data Flow
//! ```text
//! Proxied request/response
//!     → body.rs (size-limited, text-only body capture)
//!     → entry.rs (LogEntry with headers, bodies, timing)
//!     → store.rs (bounded, most-recent-first LogStore)
//!
//! Consumers:
//!     → status reporting (list)
//!     → replay (find by id)
//! ```
//!
//! # Design Decisions
//! - Bodies over the capture limit are replaced with a placeholder
//! - Captured bodies are for inspection only; relayed bodies are never truncated
//! - Entries are immutable once appended

pub mod body;
pub mod entry;
pub mod store;

pub use entry::{HeaderSnapshot, LogEntry};
pub use store::LogStore;

/// Default maximum number of retained log entries.
pub const DEFAULT_MAX_LOGS: usize = 200;

/// Default body capture limit in bytes.
pub const DEFAULT_BODY_LIMIT: usize = 100_000;
