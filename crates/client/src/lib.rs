//! Client for a ticket-locking resource server.
//!
//! [`ResourceFactory`] creates resources and hands out [`Resource`] handles;
//! each handle carries the server's ticket between calls. All HTTP goes
//! through the [`Transport`] trait.

pub mod config;
pub mod factory;
pub mod http;
pub mod resource;
pub mod transport;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeTransport;

pub use config::ClientConfig;
pub use factory::ResourceFactory;
pub use http::ReqwestTransport;
pub use resource::Resource;
pub use transport::{Method, Transport, TransportError, TransportRequest, TransportResponse};
pub use warden_core::{ErrorKind, ReadOutcome, ResourceError, ResourceResult};
