//! Mock implementations for testing
//!
//! These mocks let the runtime be exercised without real I/O.

use super::traits::*;
use crate::backend::BackendError;
use crate::route::{RouteRequest, RouteResponse};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

// ============================================================================
// Mock Routing Client
// ============================================================================

/// Mock routing client that returns queued responses
#[derive(Default)]
pub struct MockRoutingClient {
    responses: Mutex<VecDeque<Result<RouteResponse, BackendError>>>,
    delay: Option<Duration>,
    /// Record of all requests made
    pub requests: Mutex<Vec<RouteRequest>>,
}

impl MockRoutingClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every request only after `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a successful response
    pub fn queue_response(&self, response: RouteResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    /// Queue an error response
    pub fn queue_error(&self, error: BackendError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<RouteRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RoutingClient for MockRoutingClient {
    async fn calculate_route(&self, request: &RouteRequest) -> Result<RouteResponse, BackendError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::request("No mock response queued")))
    }
}

// ============================================================================
// Recording Speech Sink
// ============================================================================

/// Speech sink that keeps everything it was asked to say
#[derive(Default)]
pub struct RecordingSink {
    spoken: Mutex<Vec<(String, String)>>,
}

impl RecordingSink {
    /// `(session_id, text)` pairs, oldest first
    pub fn spoken(&self) -> Vec<(String, String)> {
        self.spoken.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechSink for RecordingSink {
    async fn say(&self, session_id: &str, text: &str) -> Result<(), SinkError> {
        self.spoken
            .lock()
            .unwrap()
            .push((session_id.to_string(), text.to_string()));
        Ok(())
    }
}
