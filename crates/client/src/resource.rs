//! Per-resource handle implementing the ticket-lock protocol.
//!
//! The handle owns one ticket slot. Every response that carries the ticket
//! header overwrites it, whatever the status, before the status is looked
//! at. Every request sends the stored ticket back. The value is opaque: it is
//! never parsed, generated, or expired here.
//!
//! A typical locked update:
//!
//! ```ignore
//! let mut queue = factory.get_resource("printer");
//! while !queue.try_lock("queue").await? {
//!     tokio::time::sleep(Duration::from_millis(200)).await;
//! }
//! let jobs = queue.read("queue", true).await?;
//! queue.write("queue", &serde_json::json!({"jobs": []})).await?;
//! queue.unlock("queue").await?;
//! ```
//!
//! Operations take `&mut self`: one handle serves one caller at a time. Wrap
//! it in a mutex, or use one handle per workflow, to share it.

use crate::transport::{Method, Transport, TransportRequest, TransportResponse};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use warden_core::error::{ResourceError, ResourceResult};
use warden_core::protocol::{self, API_KEY_HEADER, RESOURCE_ROOT, TICKET_HEADER, UNLOCK_SEGMENT};
use warden_core::ReadOutcome;

/// Everything except RFC 3986 unreserved characters.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Client handle for a single named resource.
pub struct Resource {
    name: String,
    ticket: Option<String>,
    api_key: Arc<str>,
    transport: Arc<dyn Transport>,
}

impl Resource {
    pub(crate) fn new(
        name: String,
        ticket: Option<String>,
        api_key: Arc<str>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            name,
            ticket,
            api_key,
            transport,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Last ticket the server issued to this handle.
    pub fn current_ticket(&self) -> Option<&str> {
        self.ticket.as_deref()
    }

    /// Fetch data for a selector, optionally asking for the lock.
    ///
    /// `Ok(ReadOutcome::Pending)` means the lock was requested but not yet
    /// granted; retry later with the stored ticket.
    pub async fn read(&mut self, selector: &str, lock: bool) -> ResourceResult<ReadOutcome> {
        let request = self
            .request(Method::Get, self.selector_path(selector)?)
            .with_query("lock", protocol::lock_flag(lock));

        let response = self.exchange(request, "read", selector).await?;
        let outcome =
            protocol::read_outcome(&self.name, selector, response.status, response.body.as_deref());

        match &outcome {
            Ok(ReadOutcome::Pending) => {
                tracing::debug!(resource = %self.name, selector, "lock pending")
            }
            Ok(ReadOutcome::Data(_)) => {
                tracing::debug!(resource = %self.name, selector, lock, "read ok")
            }
            Err(e) => {
                tracing::warn!(resource = %self.name, selector, error = %e, "read failed")
            }
        }
        outcome
    }

    /// [`read`](Self::read), decoding the payload into `T`.
    ///
    /// Returns `Ok(None)` while the lock is pending.
    pub async fn read_as<T: DeserializeOwned>(
        &mut self,
        selector: &str,
        lock: bool,
    ) -> ResourceResult<Option<T>> {
        match self.read(selector, lock).await? {
            ReadOutcome::Data(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| ResourceError::BadFormat(format!("Unexpected data shape: {e}"))),
            ReadOutcome::Pending => Ok(None),
        }
    }

    /// Ask for the lock on a selector.
    ///
    /// `true` only when the server answered with data carrying
    /// `"locked": true`. A pending answer is `false`; failures are returned,
    /// not folded into `false`. The data itself is not returned; call
    /// [`read`](Self::read) after acquiring the lock to get it.
    pub async fn try_lock(&mut self, selector: &str) -> ResourceResult<bool> {
        let acquired = self.read(selector, true).await?.lock_acquired();
        tracing::debug!(resource = %self.name, selector, acquired, "lock attempt");
        Ok(acquired)
    }

    /// Replace the selector's content with `payload`.
    ///
    /// The server expects a granted lock. Without a ticket the request is
    /// still sent, and the server's rejection comes back as `NotUpdated`.
    pub async fn write<T: Serialize + ?Sized>(
        &mut self,
        selector: &str,
        payload: &T,
    ) -> ResourceResult<()> {
        let body = serde_json::to_string(payload)
            .map_err(|e| ResourceError::BadFormat(format!("Failed to encode payload: {e}")))?;

        if self.ticket.is_none() {
            tracing::debug!(resource = %self.name, selector, "writing without a ticket");
        }

        let request = self
            .request(Method::Put, self.selector_path(selector)?)
            .with_json_body(body);

        let response = self.exchange(request, "write", selector).await?;
        let outcome = protocol::write_outcome(selector, response.status, response.body.as_deref());

        match &outcome {
            Ok(()) => tracing::info!(resource = %self.name, selector, "write ok"),
            Err(e) => {
                tracing::warn!(resource = %self.name, selector, error = %e, "write rejected")
            }
        }
        outcome
    }

    /// Release the lock on a selector.
    pub async fn unlock(&mut self, selector: &str) -> ResourceResult<()> {
        let path = format!("{}/{UNLOCK_SEGMENT}", self.selector_path(selector)?);
        let request = self.request(Method::Post, path);

        let response = self.exchange(request, "unlock", selector).await?;
        let outcome = protocol::unlock_outcome(selector, response.status, response.body.as_deref());

        match &outcome {
            Ok(()) => tracing::info!(resource = %self.name, selector, "unlocked"),
            Err(e) => {
                tracing::warn!(resource = %self.name, selector, error = %e, "unlock failed")
            }
        }
        outcome
    }

    /// Send one request and refresh the ticket from whatever comes back.
    async fn exchange(
        &mut self,
        request: TransportRequest,
        operation: &'static str,
        selector: &str,
    ) -> ResourceResult<TransportResponse> {
        tracing::debug!(
            resource = %self.name,
            selector,
            operation,
            method = %request.method,
            path = %request.path,
            has_ticket = self.ticket.is_some(),
            "sending"
        );

        let response = self.transport.send(request).await.map_err(|e| {
            tracing::warn!(resource = %self.name, selector, operation, error = %e, "server unavailable");
            ResourceError::from(e)
        })?;

        if let Some(ticket) = response.header(TICKET_HEADER) {
            tracing::debug!(
                resource = %self.name,
                selector,
                status = response.status,
                "ticket refreshed"
            );
            self.ticket = Some(ticket.to_string());
        }

        Ok(response)
    }

    fn request(&self, method: Method, path: String) -> TransportRequest {
        let request =
            TransportRequest::new(method, path).with_header(API_KEY_HEADER, &*self.api_key);
        match &self.ticket {
            Some(ticket) => request.with_header(TICKET_HEADER, ticket.as_str()),
            None => request,
        }
    }

    fn selector_path(&self, selector: &str) -> ResourceResult<String> {
        Ok(format!(
            "{RESOURCE_ROOT}/{}/{}",
            path_segment("resource name", &self.name)?,
            path_segment("selector", selector)?
        ))
    }
}

impl std::fmt::Debug for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resource")
            .field("name", &self.name)
            .field("has_ticket", &self.ticket.is_some())
            .finish()
    }
}

/// Percent-encode one path segment.
///
/// Empty and dot segments are rejected: URL normalisation would drop them
/// and send the request to a different endpoint.
pub(crate) fn path_segment(what: &str, segment: &str) -> ResourceResult<String> {
    if matches!(segment, "" | "." | "..") {
        return Err(ResourceError::InvalidInput(format!(
            "{what} {segment:?} is not a valid path segment"
        )));
    }
    Ok(utf8_percent_encode(segment, PATH_SEGMENT).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeTransport;
    use crate::transport::TransportError;
    use serde_json::json;
    use warden_core::ErrorKind;

    fn resource(fake: &FakeTransport, name: &str) -> Resource {
        Resource::new(name.into(), None, Arc::from("KEY"), Arc::new(fake.clone()))
    }

    fn data(value: serde_json::Value) -> String {
        protocol::encode_read_body(&value)
    }

    #[test]
    fn segments_are_percent_encoded() {
        let encode = |s: &str| path_segment("selector", s).unwrap();
        assert_eq!(encode("queue"), "queue");
        assert_eq!(encode("a b/c?d"), "a%20b%2Fc%3Fd");
        assert_eq!(encode("v1.2_x-y~z"), "v1.2_x-y~z");
        assert_eq!(encode("é"), "%C3%A9");
        assert_eq!(encode("..."), "...");
        assert_eq!(encode("%2e%2e"), "%252e%252e");
    }

    #[tokio::test]
    async fn dot_and_empty_segments_are_rejected_before_sending() {
        let fake = FakeTransport::new();

        for selector in ["", ".", ".."] {
            let mut res = resource(&fake, "printer");
            let err = res.write(selector, &json!({"x": 1})).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput, "selector {selector:?}");
            assert_eq!(res.read(selector, true).await.unwrap_err().kind(), ErrorKind::InvalidInput);
            assert_eq!(res.unlock(selector).await.unwrap_err().kind(), ErrorKind::InvalidInput);
            assert!(res.current_ticket().is_none());
        }

        for name in ["", ".", ".."] {
            let mut res = resource(&fake, name);
            let err = res.read("queue", false).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput, "name {name:?}");
        }

        assert_eq!(fake.call_count(), 0);
    }

    #[tokio::test]
    async fn read_sends_lock_flag_api_key_and_encoded_path() {
        let fake = FakeTransport::new();
        fake.push_response(TransportResponse::new(200).with_body(data(json!({"ok": true}))));

        let mut res = resource(&fake, "print er");
        res.read("jobs/1", false).await.unwrap();

        let call = fake.last_call().unwrap();
        assert_eq!(call.method, Method::Get);
        assert_eq!(call.path, "/resource/print%20er/jobs%2F1");
        assert_eq!(call.query_param("lock"), Some("0"));
        assert_eq!(call.header("x-api-key"), Some("KEY"));
        assert_eq!(call.header(TICKET_HEADER), None);
    }

    #[tokio::test]
    async fn transport_failure_leaves_ticket_untouched() {
        let fake = FakeTransport::new();
        fake.push_response(TransportResponse::new(202).with_header(TICKET_HEADER, "t1"))
            .push_error(TransportError::Connect("refused".into()));

        let mut res = resource(&fake, "printer");
        res.read("queue", true).await.unwrap();

        let err = res.read("queue", true).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ServerUnavailable);
        assert_eq!(res.current_ticket(), Some("t1"));
    }

    #[tokio::test]
    async fn error_status_still_refreshes_ticket() {
        let fake = FakeTransport::new();
        fake.push_response(
            TransportResponse::new(404)
                .with_header("X-Ticket", "from-404")
                .with_body("missing"),
        );

        let mut res = resource(&fake, "printer");
        let err = res.read("queue", false).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(res.current_ticket(), Some("from-404"));
    }

    #[tokio::test]
    async fn read_as_decodes_typed_payload() {
        #[derive(serde::Deserialize, Debug, PartialEq)]
        struct Jobs {
            jobs: Vec<u32>,
        }

        let fake = FakeTransport::new();
        fake.push_response(TransportResponse::new(200).with_body(data(json!({"jobs": [1, 2]}))))
            .push_response(TransportResponse::new(202))
            .push_response(TransportResponse::new(200).with_body(data(json!({"jobs": "x"}))));

        let mut res = resource(&fake, "printer");
        let jobs: Option<Jobs> = res.read_as("queue", false).await.unwrap();
        assert_eq!(jobs, Some(Jobs { jobs: vec![1, 2] }));

        let pending: Option<Jobs> = res.read_as("queue", true).await.unwrap();
        assert!(pending.is_none());

        let err = res.read_as::<Jobs>("queue", false).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadFormat);
    }

    #[tokio::test]
    async fn try_lock_propagates_failures() {
        let fake = FakeTransport::new();
        fake.push_response(TransportResponse::new(500).with_body("boom"))
            .push_response(TransportResponse::new(200).with_body("{not json"));

        let mut res = resource(&fake, "printer");
        let err = res.try_lock("queue").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unknown);

        let err = res.try_lock("queue").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadFormat);
    }

    #[tokio::test]
    async fn write_without_ticket_is_still_sent() {
        let fake = FakeTransport::new();
        fake.push_response(TransportResponse::new(403).with_body("no lock"));

        let mut res = resource(&fake, "printer");
        let err = res.write("queue", &json!({"x": 1})).await.unwrap_err();

        assert!(matches!(
            err,
            ResourceError::NotUpdated { status: 403, ref body, .. } if body == "no lock"
        ));
        let call = fake.last_call().unwrap();
        assert_eq!(call.header(TICKET_HEADER), None);
        assert_eq!(call.header("content-type"), Some("application/json"));
        assert_eq!(call.json_body(), Some(json!({"x": 1})));
    }

    #[tokio::test]
    async fn unlock_uses_post_on_unlock_path() {
        let fake = FakeTransport::new();
        fake.push_response(TransportResponse::new(200));

        let mut res = resource(&fake, "printer");
        res.unlock("queue").await.unwrap();

        let call = fake.last_call().unwrap();
        assert_eq!(call.method, Method::Post);
        assert_eq!(call.path, "/resource/printer/queue/unlock");
        assert!(call.body.is_none());
    }

    #[test]
    fn debug_hides_ticket_value() {
        let fake = FakeTransport::new();
        let res = Resource::new(
            "printer".into(),
            Some("secret-ticket".into()),
            Arc::from("KEY"),
            Arc::new(fake),
        );
        let rendered = format!("{res:?}");
        assert!(rendered.contains("has_ticket: true"));
        assert!(!rendered.contains("secret-ticket"));
    }
}
