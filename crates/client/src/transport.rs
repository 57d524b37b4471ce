//! The single-exchange HTTP seam.
//!
//! [`Transport`] performs one request/response exchange and nothing else: no
//! status interpretation, no retries, no ticket handling. Everything above it
//! works against this trait so tests can swap in
//! [`FakeTransport`](crate::FakeTransport).

use async_trait::async_trait;
use thiserror::Error;
use warden_core::ResourceError;

/// HTTP methods the resource server API uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outgoing request.
///
/// `path` is relative to the configured server URI and already
/// percent-encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl TransportRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Attach a serialized JSON body and its content type.
    pub fn with_json_body(self, body: String) -> Self {
        let mut request = self.with_header("content-type", "application/json");
        request.body = Some(body);
        request
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Body parsed as JSON, if there is one and it parses.
    pub fn json_body(&self) -> Option<serde_json::Value> {
        self.body
            .as_deref()
            .and_then(|b| serde_json::from_str(b).ok())
    }
}

/// What came back from one exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    /// `None` when the status line arrived but the body could not be read.
    pub body: Option<String>,
}

impl TransportResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Some(String::new()),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Mark the body as unreadable.
    pub fn without_body(mut self) -> Self {
        self.body = None;
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Failure below HTTP: nothing with a status code was received.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request timed out")]
    Timeout,

    #[error("request failed: {0}")]
    Request(String),

    /// The request could not be built; nothing was sent.
    #[error("invalid value for header {0:?}")]
    InvalidHeader(String),
}

impl From<TransportError> for ResourceError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::InvalidHeader(_) => ResourceError::InvalidInput(e.to_string()),
            _ => ResourceError::ServerUnavailable(e.to_string()),
        }
    }
}

/// Performs a single HTTP exchange against the resource server.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::ErrorKind;

    #[test]
    fn header_lookup_ignores_case() {
        let response = TransportResponse::new(202).with_header("X-Ticket", "tk-202");
        assert_eq!(response.header("x-ticket"), Some("tk-202"));
        assert_eq!(response.header("X-TICKET"), Some("tk-202"));
        assert_eq!(response.header("ticket"), None);
    }

    #[test]
    fn json_body_sets_content_type() {
        let request =
            TransportRequest::new(Method::Put, "/resource/a/b").with_json_body("{\"x\":1}".into());
        assert_eq!(request.header("Content-Type"), Some("application/json"));
        assert_eq!(request.json_body(), Some(serde_json::json!({"x": 1})));
    }

    #[test]
    fn transport_error_becomes_server_unavailable() {
        let err: ResourceError = TransportError::Timeout.into();
        assert_eq!(err.kind(), ErrorKind::ServerUnavailable);
    }

    #[test]
    fn invalid_header_is_caller_input() {
        let err: ResourceError = TransportError::InvalidHeader("x-ticket".into()).into();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
