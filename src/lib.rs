//! Inspecting HTTP reverse proxy library.

pub mod admin;
pub mod capture;
pub mod config;
pub mod engine;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod replay;
pub mod routing;

pub use config::schema::RelayConfig;
pub use engine::{ProxyEngine, StatusReport};
pub use error::{ControlError, ForwardError, ReplayError};
