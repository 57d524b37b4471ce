//! In-memory transport for tests.
//!
//! Responses are served in FIFO order from a queue of canned responses,
//! transport errors, or resolvers computing a response from the request.
//! Every request is recorded, including ones that found the queue empty.

use crate::transport::{Transport, TransportError, TransportRequest, TransportResponse};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

type Resolver = Box<dyn FnOnce(&TransportRequest) -> TransportResponse + Send>;

enum Queued {
    Response(TransportResponse),
    Error(TransportError),
    Resolver(Resolver),
}

/// Fake transport. Clones share the same queue and call log.
#[derive(Clone, Default)]
pub struct FakeTransport {
    queue: Arc<Mutex<VecDeque<Queued>>>,
    calls: Arc<Mutex<Vec<TransportRequest>>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, response: TransportResponse) -> &Self {
        self.enqueue(Queued::Response(response))
    }

    pub fn push_error(&self, error: TransportError) -> &Self {
        self.enqueue(Queued::Error(error))
    }

    pub fn push_resolver<F>(&self, resolver: F) -> &Self
    where
        F: FnOnce(&TransportRequest) -> TransportResponse + Send + 'static,
    {
        self.enqueue(Queued::Resolver(Box::new(resolver)))
    }

    /// Get all recorded requests
    pub fn calls(&self) -> Vec<TransportRequest> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn last_call(&self) -> Option<TransportRequest> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last()
            .cloned()
    }

    /// Number of queued items not yet consumed.
    pub fn pending(&self) -> usize {
        self.queue.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn enqueue(&self, item: Queued) -> &Self {
        self.queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(item);
        self
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        let next = self
            .queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();

        match next {
            Some(Queued::Response(response)) => Ok(response),
            Some(Queued::Error(error)) => Err(error),
            Some(Queued::Resolver(resolve)) => Ok(resolve(&request)),
            None => Err(TransportError::Request(format!(
                "no response queued for {} {}",
                request.method, request.path
            ))),
        }
    }
}
