//! Transport
//!
//! The HTTP session the client talks through. It owns the cookies (and so the anti-forgery
//! token) and knows nothing about carts.

use std::{borrow::Cow, time::Duration};

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

mod http;

pub use http::{HttpTransport, HttpTransportError};

/// Header carrying the anti-forgery token.
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// Header marking a request as script-originated.
pub const REQUESTED_WITH_HEADER: &str = "X-Requested-With";

/// Value of [`REQUESTED_WITH_HEADER`].
pub const REQUESTED_WITH_VALUE: &str = "XMLHttpRequest";

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Read-only request.
    Get,

    /// Mutating request.
    Post,
}

impl Method {
    /// Whether the request changes server state (and so needs the security headers).
    pub fn is_mutating(self) -> bool {
        !matches!(self, Method::Get)
    }
}

/// Request body encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// No body.
    Empty,

    /// JSON document.
    Json(serde_json::Value),

    /// `application/x-www-form-urlencoded` pairs.
    Form(Vec<(String, String)>),
}

/// One outbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// Method.
    pub method: Method,

    /// Path relative to the storefront origin, or an absolute URL.
    pub path: String,

    /// Body.
    pub body: RequestBody,

    /// Extra headers.
    pub headers: Vec<(&'static str, String)>,

    /// Upper bound the transport should apply to this request.
    pub timeout: Duration,
}

impl ApiRequest {
    /// Look up a header value by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(header, _)| header.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Raw response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,

    /// Response body text.
    pub body: String,
}

impl ApiResponse {
    /// `200 OK` with the given body.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport-level failures. None of these carry a server reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request did not complete in time.
    #[error("request timed out")]
    Timeout,

    /// The server could not be reached.
    #[error("connection failed: {0}")]
    Connect(String),

    /// Any other transport failure.
    #[error("transport failure: {0}")]
    Other(String),
}

/// HTTP session used by the request executor.
#[automock]
#[async_trait(?Send)]
pub trait Transport {
    /// Send one request and return the raw response, whatever its status.
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;

    /// The `Cookie` header value this session would send, if it holds any cookies.
    fn cookie_header(&self) -> Option<String>;
}

/// Read one cookie from a `Cookie` header value, percent-decoding it.
pub fn cookie_value(cookie_header: &str, name: &str) -> Option<String> {
    cookie_header
        .split(';')
        .map(str::trim)
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| {
            urlencoding::decode(value).map_or_else(|_| value.to_string(), Cow::into_owned)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_value_finds_named_cookie() {
        let header = "sessionid=abc; csrftoken=tok123; theme=dark";

        assert_eq!(cookie_value(header, "csrftoken"), Some("tok123".to_string()));
        assert_eq!(cookie_value(header, "missing"), None);
    }

    #[test]
    fn cookie_value_requires_exact_name() {
        assert_eq!(cookie_value("xcsrftoken=bad", "csrftoken"), None);
    }

    #[test]
    fn cookie_value_is_percent_decoded() {
        assert_eq!(
            cookie_value("csrftoken=a%2Fb%3D; other=1", "csrftoken"),
            Some("a/b=".to_string())
        );
    }

    #[test]
    fn only_get_is_read_only() {
        assert!(!Method::Get.is_mutating());
        assert!(Method::Post.is_mutating());
    }

    #[test]
    fn success_status_range() {
        assert!(ApiResponse::ok("{}").is_success());
        assert!(
            !ApiResponse {
                status: 404,
                body: String::new()
            }
            .is_success()
        );
    }
}
