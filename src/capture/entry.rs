//! Captured exchange record.

use std::collections::BTreeMap;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::routing::route::generate_id;

/// Flat header map (lowercase name → last value).
pub type HeaderSnapshot = BTreeMap<String, String>;

/// One proxied exchange, or a failed/unmatched attempt.
///
/// `route_id` and `target_url` are empty when no route matched. The response
/// fields stay `None` when the upstream call failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: String,

    /// Completion time, milliseconds since the Unix epoch.
    pub timestamp: u64,

    pub method: String,

    /// Inbound path without query string.
    pub path: String,

    /// Upstream URL without query string.
    pub target_url: String,

    /// Query string (without `?`) sent to the upstream, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    pub status: u16,

    /// Elapsed milliseconds until the upstream answered.
    pub duration: u64,

    pub route_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_headers: Option<HeaderSnapshot>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_headers: Option<HeaderSnapshot>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_body: Option<String>,
}

impl LogEntry {
    /// Start an entry for an inbound request. Status and timing are set by [`LogEntry::finish`].
    pub fn begin(method: impl Into<String>, path: impl Into<String>, headers: &HeaderMap) -> Self {
        Self {
            id: generate_id(),
            timestamp: 0,
            method: method.into(),
            path: path.into(),
            target_url: String::new(),
            query: None,
            status: 0,
            duration: 0,
            route_id: String::new(),
            request_headers: Some(snapshot_headers(headers)),
            request_body: None,
            response_headers: None,
            response_body: None,
        }
    }

    /// Stamp status, completion time and duration since `started`.
    pub fn finish(mut self, status: u16, started: Instant) -> Self {
        self.status = status;
        self.duration = started.elapsed().as_millis() as u64;
        self.timestamp = now_millis();
        self
    }

    /// Full upstream URL including the recorded query string.
    pub fn full_target_url(&self) -> String {
        match &self.query {
            Some(q) => format!("{}?{}", self.target_url, q),
            None => self.target_url.clone(),
        }
    }
}

/// Copy a header map into a flat map. Later values win; non-visible-ASCII values are skipped.
pub fn snapshot_headers(headers: &HeaderMap) -> HeaderSnapshot {
    headers
        .iter()
        .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
        .collect()
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
