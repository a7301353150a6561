//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming path (no query string)
//!     → table.rs (enabled routes, longest match prefix first)
//!     → matcher.rs (wildcard vs. mounted prefix rules)
//!     → Return: matched Route or None
//!
//! Matched Route + original path
//!     → matcher.rs build_target_url
//!     → upstream URL (query appended by the caller)
//! ```
//!
//! # Design Decisions
//! - Routes are mutable at runtime; readers see immutable snapshots
//! - No regex in hot path (prefix matching only)
//! - Equal-length prefixes resolve in insertion order

pub mod matcher;
pub mod route;
pub mod table;

pub use matcher::{build_target_url, is_wildcard, match_prefix};
pub use route::Route;
pub use table::RouteTable;
