// ddlog - core/model.rs
//
// Core data model types. Pure data definitions with no I/O and no transport
// dependencies. These types are the shared vocabulary across all layers and
// double as the wire schema of the log query API.

use crate::util::constants;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Log Entry
// =============================================================================

/// A single log event as returned by the remote system.
///
/// `id` is assigned remotely and is the only key used for de-duplication;
/// two distinct entries sharing a timestamp are told apart by it alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: String,
    pub content: LogContent,
}

/// Payload of a log event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogContent {
    /// Event timestamp in UTC.
    pub timestamp: DateTime<Utc>,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Free-form structured attributes (custom fields, durations, ...).
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,

    #[serde(default)]
    pub host: String,

    #[serde(default)]
    pub service: String,

    #[serde(default)]
    pub message: String,
}

impl LogEntry {
    /// Build an entry with empty host, service, tags and attributes.
    pub fn new(id: impl Into<String>, timestamp: DateTime<Utc>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: LogContent {
                timestamp,
                tags: Vec::new(),
                attributes: serde_json::Map::new(),
                host: String::new(),
                service: String::new(),
                message: message.into(),
            },
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.content.timestamp
    }

    pub fn message(&self) -> &str {
        &self.content.message
    }

    /// Numeric value of a custom attribute, if present and numeric.
    pub fn numeric_attribute(&self, name: &str) -> Option<f64> {
        self.content.attributes.get(name).and_then(|v| v.as_f64())
    }
}

// =============================================================================
// Query Window
// =============================================================================

/// Half-open time range `[from, to)` queried in one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl QueryWindow {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    /// Window covering the last `minutes` minutes up to `now`.
    pub fn lookback(now: DateTime<Utc>, minutes: i64) -> Self {
        Self {
            from: now - Duration::minutes(minutes),
            to: now,
        }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.from && ts < self.to
    }

    /// `from` in the API's second-precision layout.
    pub fn api_from(&self) -> String {
        self.from.format(constants::API_TIME_FORMAT).to_string()
    }

    /// `to` in the API's second-precision layout.
    pub fn api_to(&self) -> String {
        self.to.format(constants::API_TIME_FORMAT).to_string()
    }
}

// =============================================================================
// Wire request / response
// =============================================================================

/// Time bounds of a request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeRange {
    pub from: String,
    pub to: String,
}

/// JSON body posted to the log query endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryRequest {
    pub query: String,
    pub time: TimeRange,
    pub sort: &'static str,
    pub limit: u32,
    #[serde(rename = "startAt", skip_serializing_if = "Option::is_none")]
    pub start_at: Option<String>,
}

impl QueryRequest {
    /// Build a request for `window`, optionally continuing from a page token.
    pub fn new(query: &str, window: &QueryWindow, continuation: Option<&str>) -> Self {
        Self {
            query: query.to_string(),
            time: TimeRange {
                from: window.api_from(),
                to: window.api_to(),
            },
            sort: constants::SORT_ORDER,
            limit: constants::PAGE_SIZE,
            start_at: continuation.map(str::to_string),
        }
    }
}

/// Decoded response of the log query endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub logs: Vec<LogEntry>,

    /// Token for the next page. The API sends `null` or `""` on the last page.
    #[serde(rename = "nextLogId", default)]
    pub next_log_id: Option<String>,

    #[serde(default)]
    pub status: String,
}

impl QueryResponse {
    /// A response holding a single page with no continuation.
    pub fn single_page(logs: Vec<LogEntry>) -> Self {
        Self {
            logs,
            next_log_id: None,
            status: "done".to_string(),
        }
    }

    /// Continuation token, treating an empty string as absent.
    pub fn continuation(&self) -> Option<&str> {
        self.next_log_id.as_deref().filter(|t| !t.is_empty())
    }
}
