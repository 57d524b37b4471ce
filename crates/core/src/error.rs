//! Centralized error types for the Warden workspace.

use thiserror::Error;

/// Tag identifying which failure class an error belongs to.
///
/// Stable across releases so callers can branch on it without matching
/// every field of [`ResourceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ServerUnavailable,
    NotFound,
    AlreadyExists,
    Unauthorized,
    BadFormat,
    NotUpdated,
    Unknown,
    InvalidInput,
}

/// Top-level error enum. One variant per failure class.
///
/// Variants produced from an HTTP response carry the status code and the raw
/// body (best-effort, empty when the body could not be read) so a failure can
/// be diagnosed without contacting the server again.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ResourceError {
    /// Connect, DNS, or timeout failure. No HTTP status was received.
    #[error("Failed to contact resource server: {0}")]
    ServerUnavailable(String),

    #[error("Selector {selector:?} not found for resource {resource:?}")]
    NotFound { resource: String, selector: String },

    #[error("Resource {0:?} already exists")]
    AlreadyExists(String),

    #[error("Unauthorized (HTTP 401): {body}")]
    Unauthorized { body: String },

    /// Malformed JSON at either decode layer of a read response.
    #[error("Bad format: {0}")]
    BadFormat(String),

    #[error("Write failed for {selector:?} (HTTP {status}): {body}")]
    NotUpdated {
        selector: String,
        status: u16,
        body: String,
    },

    #[error("{operation} failed (HTTP {status}): {body}")]
    Unknown {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ResourceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ServerUnavailable(_) => ErrorKind::ServerUnavailable,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::BadFormat(_) => ErrorKind::BadFormat,
            Self::NotUpdated { .. } => ErrorKind::NotUpdated,
            Self::Unknown { .. } => ErrorKind::Unknown,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
        }
    }

    /// HTTP status that produced this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound { .. } => Some(404),
            Self::AlreadyExists(_) => Some(409),
            Self::Unauthorized { .. } => Some(401),
            Self::NotUpdated { status, .. } | Self::Unknown { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type ResourceResult<T> = Result<T, ResourceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_carries_status_and_body() {
        let err = ResourceError::Unknown {
            operation: "unlock \"queue\"".into(),
            status: 404,
            body: "not found".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Unknown);
        assert_eq!(err.status(), Some(404));
        assert_eq!(
            err.to_string(),
            "unlock \"queue\" failed (HTTP 404): not found"
        );
    }

    #[test]
    fn transport_failures_have_no_status() {
        let err = ResourceError::ServerUnavailable("connection refused".into());
        assert_eq!(err.kind(), ErrorKind::ServerUnavailable);
        assert!(err.status().is_none());
    }
}
