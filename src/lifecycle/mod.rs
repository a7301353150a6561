//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! start():
//!     Stopped → bind listener → spawn accept loop → Running
//!
//! stop():
//!     Running → trigger shutdown → close socket, abort connections → Stopped
//!
//! Process exit (signals.rs):
//!     Ctrl+C → stop data plane → stop control API
//! ```
//!
//! # Design Decisions
//! - At most one running listener per engine
//! - Stop is abrupt: in-flight requests are not drained
//! - Bind failures leave the engine Stopped

pub mod running;
pub mod shutdown;
pub mod signals;

pub use running::RunningProxy;
pub use shutdown::Shutdown;
