//! Domain types shared by the Warden client and its front ends.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Read outcomes
// ---------------------------------------------------------------------------

/// Non-error result of a read exchange.
///
/// `Pending` is normal control flow: the lock was requested but not granted
/// yet, and the ticket needed to retry has been stored on the handle.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    Data(Value),
    Pending,
}

impl ReadOutcome {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Payload of a `Data` outcome.
    pub fn into_data(self) -> Option<Value> {
        match self {
            Self::Data(value) => Some(value),
            Self::Pending => None,
        }
    }

    /// Reduce to a lock-attempt answer.
    ///
    /// `Data` counts as acquired only when the payload carries `locked: true`.
    pub fn lock_acquired(&self) -> bool {
        match self {
            Self::Data(value) => value
                .get("locked")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            Self::Pending => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Wire bodies
// ---------------------------------------------------------------------------

/// Body of `POST /resource`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateResource {
    pub name: String,
    /// Server-side lock timeout, in seconds.
    pub timeout: u64,
}

/// Outer layer of a 200 read body: `{"data": "<json-encoded string>"}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReadEnvelope {
    pub data: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lock_acquired_requires_explicit_true() {
        assert!(ReadOutcome::Data(json!({"locked": true})).lock_acquired());
        assert!(!ReadOutcome::Data(json!({"locked": false})).lock_acquired());
        assert!(!ReadOutcome::Data(json!({"v": 42})).lock_acquired());
        assert!(!ReadOutcome::Data(json!({"locked": "yes"})).lock_acquired());
        assert!(!ReadOutcome::Data(Value::Null).lock_acquired());
        assert!(!ReadOutcome::Pending.lock_acquired());
    }

    #[test]
    fn pending_carries_no_data() {
        assert!(ReadOutcome::Pending.is_pending());
        assert_eq!(ReadOutcome::Pending.into_data(), None);

        let data = ReadOutcome::Data(json!({"v": 42}));
        assert!(!data.is_pending());
        assert_eq!(data.into_data(), Some(json!({"v": 42})));
    }

    #[test]
    fn create_body_shape() {
        let body = serde_json::to_value(CreateResource {
            name: "printer".into(),
            timeout: 300,
        })
        .unwrap();
        assert_eq!(body, json!({"name": "printer", "timeout": 300}));
    }
}
