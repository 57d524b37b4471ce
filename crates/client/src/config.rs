//! Client configuration: server address, API key, and request timeout.

use serde::{Deserialize, Deserializer};
use std::time::Duration;
use warden_core::error::{ResourceError, ResourceResult};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings applied to every request issued through one factory.
///
/// Deserializable so it can sit inside a host application's own config:
///
/// ```ignore
/// [warden]
/// server_uri = "http://localhost:9501"
/// api_key = "..."
/// timeout = 30
/// ```
#[derive(Clone, Deserialize)]
pub struct ClientConfig {
    server_uri: String,
    api_key: String,
    /// Seconds.
    #[serde(default = "default_timeout", deserialize_with = "timeout_secs")]
    timeout: Duration,
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

fn timeout_secs<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
    u64::deserialize(d).map(Duration::from_secs)
}

impl ClientConfig {
    pub fn new(server_uri: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            server_uri: server_uri.into(),
            api_key: api_key.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the per-request timeout (default: 10s).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Server URI without a trailing slash.
    pub fn server_uri(&self) -> &str {
        self.server_uri.trim_end_matches('/')
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn validate(&self) -> ResourceResult<()> {
        if self.server_uri().trim().is_empty() {
            return Err(ResourceError::InvalidInput(
                "server URI must not be empty".into(),
            ));
        }
        if self.api_key.trim().is_empty() {
            return Err(ResourceError::InvalidInput("API key must not be empty".into()));
        }
        if self.timeout.is_zero() {
            return Err(ResourceError::InvalidInput(
                "timeout must be greater than zero".into(),
            ));
        }

        let url = url::Url::parse(self.server_uri()).map_err(|e| {
            ResourceError::InvalidInput(format!("invalid server URI {:?}: {e}", self.server_uri))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ResourceError::InvalidInput(format!(
                "server URI must use http or https, got {:?}",
                url.scheme()
            )));
        }

        Ok(())
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("server_uri", &self.server_uri)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}
