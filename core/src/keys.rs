//! Reserved attribute key constants for Vahti transactions
//!
//! These are the namespaced keys the engine itself writes. Route and query
//! parameters are recorded under their bare names and are not listed here.

/// HTTP request method (`GET`, `POST`, ...)
pub const REQUEST_METHOD: &str = "request.method";

/// Raw request URI; only recorded when `send_request_uri_attribute` is enabled
pub const REQUEST_URI: &str = "request.uri";

/// Value of the request's Host header
pub const REQUEST_HEADERS_HOST: &str = "request.headers.host";

/// Numeric HTTP response status code
pub const RESPONSE_STATUS: &str = "response.status";

/// String form of the response status code
pub const HTTP_RESPONSE_CODE: &str = "httpResponseCode";

/// Response status message, when the transport supplies one
pub const HTTP_RESPONSE_MESSAGE: &str = "httpResponseMessage";

/// Value of the response's Content-Length header
pub const RESPONSE_CONTENT_LENGTH: &str = "response.headers.contentLength";

/// Value of the response's Content-Type header
pub const RESPONSE_CONTENT_TYPE: &str = "response.headers.contentType";
