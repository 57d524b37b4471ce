//! Error taxonomy, outcome types, and wire contract for the Warden client.
//!
//! Foundation crate -- no async or I/O dependencies.

pub mod error;
pub mod protocol;
pub mod types;

pub use error::{ErrorKind, ResourceError, ResourceResult};
pub use types::{CreateResource, ReadOutcome};
