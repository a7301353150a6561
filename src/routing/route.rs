//! Route definition and validation.

use serde::{Deserialize, Serialize};

use crate::error::ControlError;

/// A rule mapping an inbound path prefix to an upstream base URL.
///
/// Serialized in camelCase, which is also the persisted settings layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    /// Opaque identifier, immutable for the lifetime of the route.
    pub id: String,

    /// Path prefix to match. A trailing `*` marks a wildcard route.
    pub path_prefix: String,

    /// Upstream base URL (`http://` or `https://`).
    pub target_base_url: String,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Route {
    /// Create a new enabled route after validating prefix and target.
    pub fn new(
        id: impl Into<String>,
        path_prefix: impl Into<String>,
        target_base_url: impl Into<String>,
    ) -> Result<Self, ControlError> {
        let path_prefix = path_prefix.into();
        let target_base_url = target_base_url.into();
        validate(&path_prefix, &target_base_url)?;

        Ok(Self {
            id: id.into(),
            path_prefix,
            target_base_url,
            enabled: true,
        })
    }

    /// The prefix actually compared against paths (`*` marker stripped).
    pub fn match_prefix(&self) -> &str {
        super::matcher::match_prefix(&self.path_prefix)
    }

    pub fn is_wildcard(&self) -> bool {
        super::matcher::is_wildcard(&self.path_prefix)
    }
}

/// Check the route invariants shared by add and edit.
pub fn validate(path_prefix: &str, target_base_url: &str) -> Result<(), ControlError> {
    if !path_prefix.starts_with('/') {
        return Err(ControlError::InvalidPathPrefix);
    }
    if !target_base_url.starts_with("http://") && !target_base_url.starts_with("https://") {
        return Err(ControlError::InvalidTargetUrl);
    }
    Ok(())
}

/// Generate a short random identifier for routes and log entries.
pub fn generate_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}
