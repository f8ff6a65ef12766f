//! Captured Response Module
//!
//! Defines the response record stored in cache partitions and returned by
//! the network layer.

use axum::body::Bytes;
use chrono::{DateTime, Utc};

// == Captured Response ==
/// A fully buffered HTTP response.
///
/// Entries are never mutated after being written to a partition; a later
/// write for the same key replaces the whole value.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedResponse {
    /// HTTP status code
    pub status: u16,
    /// Reason phrase
    pub status_text: String,
    /// Response headers in arrival order
    pub headers: Vec<(String, String)>,
    /// Response body
    pub body: Bytes,
    /// When the response was received from the network or synthesized
    pub captured_at: DateTime<Utc>,
}

impl CapturedResponse {
    // == Constructor ==
    /// Creates a response with no headers.
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            status_text: reason_phrase(status).to_string(),
            headers: Vec::new(),
            body: body.into(),
            captured_at: Utc::now(),
        }
    }

    /// Shorthand for a `200 OK` response.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::new(200, body)
    }

    /// Synthetic `503 Service Unavailable` with a plain-text body.
    pub fn service_unavailable(body: &'static str) -> Self {
        Self::new(503, body).with_header("Content-Type", "text/plain")
    }

    /// Adds a header, keeping existing ones.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    // == Is Ok ==
    /// Returns true for 2xx statuses. Only these are written to the cache.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup returning the first match.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Body as UTF-8, lossy.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Canonical reason phrase for the statuses the shell produces or relays.
fn reason_phrase(status: u16) -> &'static str {
    axum::http::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or("")
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_range() {
        assert!(CapturedResponse::new(200, "").is_ok());
        assert!(CapturedResponse::new(204, "").is_ok());
        assert!(!CapturedResponse::new(304, "").is_ok());
        assert!(!CapturedResponse::new(404, "").is_ok());
        assert!(!CapturedResponse::new(500, "").is_ok());
    }

    #[test]
    fn test_service_unavailable() {
        let response = CapturedResponse::service_unavailable("Offline");
        assert_eq!(response.status, 503);
        assert_eq!(response.status_text, "Service Unavailable");
        assert_eq!(response.header("content-type"), Some("text/plain"));
        assert_eq!(response.text(), "Offline");
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let response = CapturedResponse::ok("body")
            .with_header("Content-Type", "text/html")
            .with_header("ETag", "\"abc\"");
        assert_eq!(response.header("etag"), Some("\"abc\""));
        assert_eq!(response.header("CONTENT-TYPE"), Some("text/html"));
        assert!(response.header("x-missing").is_none());
    }
}
