//! Adapter-facing HTTP metadata types
//!
//! Framework adapters and the transport layer hand these to the transaction's
//! `record_*` methods. They are deliberately dumb carriers: header lookup is
//! case-insensitive (names are lowercased on insert), and nothing here knows
//! about destinations or filtering.

use std::collections::HashMap;

/// Request-side metadata known once routing begins
///
/// # Example
///
/// ```
/// use vahti_agent::RequestMetadata;
///
/// let request = RequestMetadata::new("GET", "/user/5")
///     .with_header("Host", "localhost:8089");
/// assert_eq!(request.header("host"), Some("localhost:8089"));
/// ```
#[derive(Debug, Clone)]
pub struct RequestMetadata {
    method: String,
    uri: String,
    headers: HashMap<String, String>,
}

impl RequestMetadata {
    /// Create request metadata for a method and URI
    pub fn new(method: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            uri: uri.into(),
            headers: HashMap::new(),
        }
    }

    /// Attach a header (name matched case-insensitively on lookup)
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// HTTP method
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Request URI as received
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Look up a header value, case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Response-side metadata supplied by the transport layer
///
/// `status_message` is optional: some transports (HTTP/2 among them) carry no
/// reason phrase, and its absence is legitimate rather than an error.
#[derive(Debug, Clone)]
pub struct ResponseMetadata {
    status: u16,
    status_message: Option<String>,
    headers: HashMap<String, String>,
}

impl ResponseMetadata {
    /// Create response metadata for a status code
    pub fn new(status: u16) -> Self {
        Self {
            status,
            status_message: None,
            headers: HashMap::new(),
        }
    }

    /// Attach the transport's status message, when it supplies one
    pub fn with_status_message(mut self, message: impl Into<String>) -> Self {
        self.status_message = Some(message.into());
        self
    }

    /// Attach a header (name matched case-insensitively on lookup)
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Numeric status code
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Status message, if the transport exposed one
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    /// Look up a header value, case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}
