//! HTTP transport backed by reqwest.

use crate::config::ClientConfig;
use crate::transport::{Method, Transport, TransportError, TransportRequest, TransportResponse};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use warden_core::error::{ResourceError, ResourceResult};

/// Sends requests to the configured server URI.
///
/// ```ignore
/// let transport = ReqwestTransport::new(&ClientConfig::new("http://localhost:9501", "KEY"))?;
/// ```
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_uri: String,
}

impl ReqwestTransport {
    pub fn new(config: &ClientConfig) -> ResourceResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| ResourceError::InvalidInput(format!("Failed to build HTTP client: {e}")))?;

        tracing::debug!(
            base_uri = config.server_uri(),
            timeout_ms = config.timeout().as_millis() as u64,
            "http transport ready"
        );

        Ok(Self {
            client,
            base_uri: config.server_uri().to_string(),
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let url = format!("{}{}", self.base_uri, request.path);
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
        };

        let mut builder = self.client.request(method, &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| TransportError::InvalidHeader(name.clone()))?;
            let header_value =
                encode_header(value).ok_or_else(|| TransportError::InvalidHeader(name.clone()))?;
            builder = builder.header(header_name, header_value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let resp = builder.send().await?;

        let status = resp.status().as_u16();
        let headers = resp
            .headers()
            .iter()
            .map(|(name, value)| (name.as_str().to_string(), decode_header(value)))
            .collect();

        // The status is already known; losing the body must not hide it.
        let body = match resp.text().await {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!(status, error = %e, "failed to read response body");
                None
            }
        };

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}

/// Header bytes as text, one char per byte (ISO-8859-1), so obs-text values
/// such as a non-ASCII ticket survive the trip back through
/// [`encode_header`] unchanged.
fn decode_header(value: &HeaderValue) -> String {
    value.as_bytes().iter().map(|&b| char::from(b)).collect()
}

/// Inverse of [`decode_header`]. `None` for chars above U+00FF or bytes a
/// header value cannot hold (control characters, newlines).
fn encode_header(text: &str) -> Option<HeaderValue> {
    let bytes: Option<Vec<u8>> = text.chars().map(|c| u8::try_from(c).ok()).collect();
    HeaderValue::from_bytes(&bytes?).ok()
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else {
            Self::Request(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn obs_text_header_round_trips() {
        let raw = HeaderValue::from_bytes(b"tk-\xe9\xff").unwrap();
        let text = decode_header(&raw);
        assert_eq!(text, "tk-\u{e9}\u{ff}");
        assert_eq!(encode_header(&text).unwrap().as_bytes(), raw.as_bytes());
    }

    #[test]
    fn ascii_header_is_unchanged() {
        let raw = HeaderValue::from_static("abc123");
        assert_eq!(decode_header(&raw), "abc123");
        assert_eq!(encode_header("abc123").unwrap(), raw);
    }

    #[test]
    fn unsendable_values_are_refused() {
        assert!(encode_header("bad\nticket").is_none());
        assert!(encode_header("tk-\u{2603}").is_none());
    }
}
