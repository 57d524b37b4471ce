//! Creates resources server-side and hands out [`Resource`] handles.

use crate::config::ClientConfig;
use crate::http::ReqwestTransport;
use crate::resource::{path_segment, Resource};
use crate::transport::{Method, Transport, TransportRequest};
use std::sync::Arc;
use warden_core::error::{ResourceError, ResourceResult};
use warden_core::protocol::{self, API_KEY_HEADER, RESOURCE_ROOT};
use warden_core::CreateResource;

/// Entry point of the client.
///
/// Every handle it produces shares the factory's transport and API key but
/// owns its own ticket slot.
///
/// ```ignore
/// let factory = ResourceFactory::new(ClientConfig::new("http://localhost:9501", "KEY"))?;
/// let mut printer = factory.create_resource("printer", 300).await?;
/// ```
pub struct ResourceFactory {
    api_key: Arc<str>,
    transport: Arc<dyn Transport>,
}

impl ResourceFactory {
    /// Validate `config` and connect through the reqwest transport.
    pub fn new(config: ClientConfig) -> ResourceResult<Self> {
        config.validate()?;
        let transport = ReqwestTransport::new(&config)?;
        Ok(Self::from_parts(config, Arc::new(transport)))
    }

    /// Validate `config` and use the given transport for every exchange.
    pub fn with_transport<T: Transport + 'static>(
        config: ClientConfig,
        transport: T,
    ) -> ResourceResult<Self> {
        config.validate()?;
        Ok(Self::from_parts(config, Arc::new(transport)))
    }

    fn from_parts(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        tracing::info!(server_uri = config.server_uri(), "resource factory ready");
        Self {
            api_key: Arc::from(config.api_key()),
            transport,
        }
    }

    /// Create `name` on the server with a lock timeout of `timeout_secs`.
    ///
    /// Fails with `AlreadyExists` on 409 and `Unauthorized` on 401. Not
    /// retried. A name that cannot be addressed as a path segment is refused
    /// without contacting the server.
    pub async fn create_resource(&self, name: &str, timeout_secs: u64) -> ResourceResult<Resource> {
        path_segment("resource name", name)?;

        let body = serde_json::to_string(&CreateResource {
            name: name.to_string(),
            timeout: timeout_secs,
        })
        .map_err(|e| ResourceError::BadFormat(format!("Failed to encode create body: {e}")))?;

        let request = TransportRequest::new(Method::Post, RESOURCE_ROOT)
            .with_header(API_KEY_HEADER, &*self.api_key)
            .with_json_body(body);

        tracing::debug!(resource = name, timeout_secs, "creating resource");

        let response = self.transport.send(request).await.map_err(|e| {
            tracing::warn!(resource = name, error = %e, "server unavailable");
            ResourceError::from(e)
        })?;

        if let Err(e) = protocol::create_outcome(name, response.status, response.body.as_deref()) {
            tracing::warn!(resource = name, status = response.status, error = %e, "create failed");
            return Err(e);
        }

        tracing::info!(resource = name, timeout_secs, "resource created");
        Ok(self.handle(name, None))
    }

    /// Handle for an existing resource. No request is made.
    pub fn get_resource(&self, name: &str) -> Resource {
        self.handle(name, None)
    }

    /// Handle seeded with a ticket the server issued earlier, e.g. in another
    /// process. No request is made.
    pub fn resume_resource(&self, name: &str, ticket: impl Into<String>) -> Resource {
        self.handle(name, Some(ticket.into()))
    }

    fn handle(&self, name: &str, ticket: Option<String>) -> Resource {
        Resource::new(
            name.to_string(),
            ticket,
            Arc::clone(&self.api_key),
            Arc::clone(&self.transport),
        )
    }
}
