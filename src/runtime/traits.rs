//! Trait abstractions for runtime I/O
//!
//! The runtime only talks to the outside world through these traits, so
//! the executor can be driven by mocks in tests.

pub use crate::backend::RoutingClient;
pub use crate::speech::SpeechComposer;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("speech sink failed: {0}")]
pub struct SinkError(pub String);

/// Asynchronous speech output, used when a reply misses the latency bound
#[async_trait]
pub trait SpeechSink: Send + Sync {
    async fn say(&self, session_id: &str, text: &str) -> Result<(), SinkError>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: SpeechSink + ?Sized> SpeechSink for Arc<T> {
    async fn say(&self, session_id: &str, text: &str) -> Result<(), SinkError> {
        (**self).say(session_id, text).await
    }
}

impl<T: SpeechComposer + ?Sized> SpeechComposer for Arc<T> {
    fn compose(&self, utterance: &crate::dialog::Utterance) -> String {
        (**self).compose(utterance)
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SayRequest<'a> {
    session_id: &'a str,
    text: &'a str,
}

/// Posts late replies to a text-to-speech endpoint
pub struct HttpSpeechSink {
    client: Client,
    url: String,
}

impl HttpSpeechSink {
    pub fn new(url: impl Into<String>) -> Result<Self, SinkError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| SinkError(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl SpeechSink for HttpSpeechSink {
    async fn say(&self, session_id: &str, text: &str) -> Result<(), SinkError> {
        let response = self
            .client
            .post(&self.url)
            .json(&SayRequest { session_id, text })
            .send()
            .await
            .map_err(|e| SinkError(format!("Request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SinkError(format!("HTTP {status}")));
        }
        Ok(())
    }
}

/// Sink for deployments without a speech endpoint: the text only reaches the log
pub struct LogSpeechSink;

#[async_trait]
impl SpeechSink for LogSpeechSink {
    async fn say(&self, session_id: &str, text: &str) -> Result<(), SinkError> {
        tracing::info!(session_id = %session_id, text = %text, "Late reply");
        Ok(())
    }
}
