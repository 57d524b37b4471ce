//! Wire contract of the resource server and the status-to-outcome mapping.
//!
//! Every function here is pure: it takes what came back from one exchange
//! and returns the typed result. The client crate calls these after the
//! ticket slot has already been refreshed from the response headers.
//!
//! | Operation | Method | Path                                  | Success  |
//! |-----------|--------|---------------------------------------|----------|
//! | create    | POST   | `/resource`                           | 200, 201 |
//! | read      | GET    | `/resource/{name}/{selector}?lock=0/1`  | 200, 202 |
//! | write     | PUT    | `/resource/{name}/{selector}`         | 200, 204 |
//! | unlock    | POST   | `/resource/{name}/{selector}/unlock`  | 200      |

use crate::error::{ResourceError, ResourceResult};
use crate::types::{ReadEnvelope, ReadOutcome};
use serde_json::Value;

/// Header carrying the server-issued ticket, on both requests and responses.
pub const TICKET_HEADER: &str = "x-ticket";

/// Header carrying the static API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Collection path; also the create endpoint.
pub const RESOURCE_ROOT: &str = "/resource";

/// Trailing segment of the unlock endpoint.
pub const UNLOCK_SEGMENT: &str = "unlock";

/// Query value for the `lock` parameter.
pub fn lock_flag(lock: bool) -> &'static str {
    if lock {
        "1"
    } else {
        "0"
    }
}

/// Map a `POST /resource` response.
pub fn create_outcome(name: &str, status: u16, body: Option<&str>) -> ResourceResult<()> {
    match status {
        200 | 201 => Ok(()),
        409 => Err(ResourceError::AlreadyExists(name.to_string())),
        401 => Err(ResourceError::Unauthorized {
            body: diagnostic(body),
        }),
        _ => Err(ResourceError::Unknown {
            operation: format!("create resource {name:?}"),
            status,
            body: diagnostic(body),
        }),
    }
}

/// Map a `GET /resource/{name}/{selector}` response.
pub fn read_outcome(
    resource: &str,
    selector: &str,
    status: u16,
    body: Option<&str>,
) -> ResourceResult<ReadOutcome> {
    match status {
        200 => {
            let body = body.ok_or_else(|| {
                ResourceError::BadFormat("response body could not be read".into())
            })?;
            decode_read_body(body).map(ReadOutcome::Data)
        }
        202 => Ok(ReadOutcome::Pending),
        404 => Err(ResourceError::NotFound {
            resource: resource.to_string(),
            selector: selector.to_string(),
        }),
        _ => Err(ResourceError::Unknown {
            operation: format!("read {selector:?}"),
            status,
            body: diagnostic(body),
        }),
    }
}

/// Map a `PUT /resource/{name}/{selector}` response.
pub fn write_outcome(selector: &str, status: u16, body: Option<&str>) -> ResourceResult<()> {
    match status {
        200 | 204 => Ok(()),
        _ => Err(ResourceError::NotUpdated {
            selector: selector.to_string(),
            status,
            body: diagnostic(body),
        }),
    }
}

/// Map a `POST /resource/{name}/{selector}/unlock` response.
pub fn unlock_outcome(selector: &str, status: u16, body: Option<&str>) -> ResourceResult<()> {
    match status {
        200 => Ok(()),
        _ => Err(ResourceError::Unknown {
            operation: format!("unlock {selector:?}"),
            status,
            body: diagnostic(body),
        }),
    }
}

/// Decode a 200 read body.
///
/// The server double-encodes: the body is `{"data": "<json string>"}` and the
/// string is parsed again to obtain the value. An empty body is `null`.
pub fn decode_read_body(body: &str) -> ResourceResult<Value> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }

    let outer: Value = serde_json::from_str(body).map_err(|e| {
        ResourceError::BadFormat(format!("Invalid JSON returned by resource server: {e}"))
    })?;

    if !outer.is_object() {
        return Err(ResourceError::BadFormat(
            "Expected a JSON object from resource server".into(),
        ));
    }

    let envelope: ReadEnvelope = serde_json::from_value(outer)
        .map_err(|e| ResourceError::BadFormat(format!("Invalid response envelope: {e}")))?;

    serde_json::from_str(&envelope.data)
        .map_err(|e| ResourceError::BadFormat(format!("Invalid JSON data: {e}")))
}

/// Wrap a value the way the server does in a 200 read body.
pub fn encode_read_body(value: &Value) -> String {
    serde_json::json!({ "data": value.to_string() }).to_string()
}

// Best-effort body for diagnostics; an unreadable body becomes empty.
fn diagnostic(body: Option<&str>) -> String {
    body.unwrap_or_default().to_string()
}
