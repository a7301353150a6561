//! Replay of captured requests.
//!
//! # Responsibilities
//! - Rebuild a request from a log entry (method, flat headers, captured body)
//! - Send it straight to the recorded target, bypassing the route table
//! - Return status and response text without logging a new entry
//!
//! # Design Decisions
//! - Captured bodies are sent as recorded, placeholders included
//! - Hop-by-hop headers, `host` and `content-length` are not replayed

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method};
use serde::Serialize;

use crate::capture::LogEntry;
use crate::error::ReplayError;
use crate::http::forwarder::{has_no_body, upstream_client};
use crate::http::headers::is_hop_by_hop;

/// Result of a successful replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayOutcome {
    pub status: u16,
    pub body: String,
}

/// Re-issues captured requests.
#[derive(Clone)]
pub struct Replayer {
    client: reqwest::Client,
}

impl Replayer {
    pub fn new() -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(upstream_client()?))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Send the captured request of `entry` to its recorded target.
    pub async fn replay(&self, entry: &LogEntry) -> Result<ReplayOutcome, ReplayError> {
        let method = Method::from_bytes(entry.method.as_bytes())
            .map_err(|e| ReplayError::InvalidRequest(e.to_string()))?;
        let target = entry.full_target_url();

        let mut request = self
            .client
            .request(method.clone(), &target)
            .headers(replay_headers(entry));

        if !has_no_body(&method) {
            if let Some(body) = entry.request_body.as_ref().filter(|b| !b.is_empty()) {
                request = request.body(body.clone());
            }
        }

        tracing::debug!(log_id = %entry.id, method = %method, target = %target, "Replaying request");

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(ReplayOutcome { status, body })
    }
}

/// Captured headers that can be sent again.
fn replay_headers(entry: &LogEntry) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let Some(captured) = &entry.request_headers else {
        return headers;
    };

    for (name, value) in captured {
        if is_hop_by_hop(name) || name.eq_ignore_ascii_case(header::CONTENT_LENGTH.as_str()) {
            continue;
        }
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            headers.insert(name, value);
        }
    }
    headers
}
