//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!
//! settings file (JSON, port + routes)
//!     → settings.rs (load at startup)
//!     → engine mutations
//!     → settings.rs (full rewrite after each mutation)
//! ```
//!
//! # Design Decisions
//! - Application config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Persisted settings are the only runtime-writable configuration

pub mod loader;
pub mod schema;
pub mod settings;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AdminConfig, CaptureConfig, ListenerConfig, LogFormat, ObservabilityConfig, RelayConfig,
    SettingsConfig,
};
pub use settings::{ProxySettings, SettingsError, SettingsStore};
