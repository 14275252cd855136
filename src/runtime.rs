//! Runtime for executing dialogs
//!
//! Owns the live sessions, dispatches each incoming message to the single
//! continuation its session is waiting for, and decides whether the reply
//! goes back synchronously or through the speech sink.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::DialogSession;
pub use traits::*;

use crate::backend::{GoogleMaps, LoggingRoutingClient};
use crate::config::{AssistantConfig, DialogSettings, Locations};
use crate::dialog::{DialogContext, DialogState, Event, Flow, TransitionError};
use crate::slot::{Intent, IntentMessage};
use crate::speech::EnglishComposer;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

/// Type alias for the production runtime with concrete implementations
pub type ProductionRuntime =
    DialogRuntime<LoggingRoutingClient<Arc<GoogleMaps>>, EnglishComposer, Arc<dyn SpeechSink>>;

/// What the transport should do with the session after a turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionAction {
    /// Keep listening, but only for these intents
    Continue { intent_filter: Vec<String> },
    End,
}

/// Synchronous answer to one turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnReply {
    pub session_id: String,
    /// Absent when nothing is said, or when the text went to the speech sink
    pub text: Option<String>,
    pub action: SessionAction,
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("intent `{0}` does not start a dialog")]
    UnknownIntent(String),
    #[error("no dialog in progress for session {0}")]
    SessionNotFound(String),
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// Manager for all live dialogs
pub struct DialogRuntime<R, C, S> {
    settings: DialogSettings,
    locations: Locations,
    latency_bound: Duration,
    routing: R,
    composer: C,
    sink: S,
    sessions: RwLock<HashMap<String, Arc<Mutex<DialogSession>>>>,
}

impl<R, C, S> DialogRuntime<R, C, S>
where
    R: RoutingClient,
    C: SpeechComposer,
    S: SpeechSink,
{
    pub fn new(config: &AssistantConfig, routing: R, composer: C, sink: S) -> Self {
        Self {
            settings: config.dialog,
            locations: config.locations.clone(),
            latency_bound: config.latency_bound,
            routing,
            composer,
            sink,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Handle a recognized intent, starting a dialog if the session has none
    pub async fn handle_intent(&self, mut message: IntentMessage) -> Result<TurnReply, RuntimeError> {
        let started = Instant::now();
        if message.session_id.is_empty() {
            message.session_id = uuid::Uuid::new_v4().to_string();
        }
        let session_id = message.session_id.clone();
        let intent = message.intent.local_name().to_string();

        let session = match self.get_session(&session_id).await {
            Some(session) => session,
            None if Flow::from_intent(&intent).is_some() => self.create_session(&session_id).await,
            None => return Err(RuntimeError::UnknownIntent(intent)),
        };

        tracing::info!(session_id = %session_id, intent = %intent, "Intent received");

        let mut session = session.lock().await;
        let event = Event::from_message(&session.state, message).ok_or_else(|| {
            RuntimeError::Transition(if session.state.is_terminal() {
                TransitionError::SessionEnded
            } else {
                TransitionError::InvalidTransition(format!("intent {intent} in {:?}", session.state))
            })
        })?;

        self.run_turn(&mut session, event, started).await
    }

    /// Handle input that matched none of the session's registered intents
    pub async fn handle_not_recognized(&self, session_id: &str) -> Result<TurnReply, RuntimeError> {
        let started = Instant::now();
        let session = self
            .get_session(session_id)
            .await
            .ok_or_else(|| RuntimeError::SessionNotFound(session_id.to_string()))?;

        tracing::info!(session_id = %session_id, "Input not recognized");

        let message = IntentMessage {
            session_id: session_id.to_string(),
            input: String::new(),
            intent: Intent {
                intent_name: String::new(),
                confidence_score: 0.0,
            },
            slots: Vec::new(),
        };

        let mut session = session.lock().await;
        self.run_turn(&mut session, Event::NotRecognized { message }, started)
            .await
    }

    /// Current state of a live dialog
    pub async fn session_state(&self, session_id: &str) -> Option<DialogState> {
        let session = self.get_session(session_id).await?;
        let state = session.lock().await.state.clone();
        Some(state)
    }

    /// Drop a dialog the transport ended on its own, e.g. after a silent timeout
    pub async fn end_session(&self, session_id: &str) -> Result<(), RuntimeError> {
        let removed = self.sessions.write().await.remove(session_id);
        match removed {
            Some(_) => {
                tracing::info!(session_id = %session_id, "Session ended by transport");
                Ok(())
            }
            None => Err(RuntimeError::SessionNotFound(session_id.to_string())),
        }
    }

    pub async fn active_sessions(&self) -> usize {
        self.sessions.read().await.len()
    }

    async fn get_session(&self, session_id: &str) -> Option<Arc<Mutex<DialogSession>>> {
        self.sessions.read().await.get(session_id).cloned()
    }

    async fn create_session(&self, session_id: &str) -> Arc<Mutex<DialogSession>> {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                let context = DialogContext::new(session_id, self.settings, self.locations.clone());
                Arc::new(Mutex::new(DialogSession::new(context)))
            })
            .clone()
    }

    async fn run_turn(
        &self,
        session: &mut DialogSession,
        event: Event,
        started: Instant,
    ) -> Result<TurnReply, RuntimeError> {
        let session_id = session.context.session_id.clone();
        let outcome = session.process(event, &self.routing, &self.composer).await;

        // Finished dialogs are dropped whatever the outcome
        if session.state.is_terminal() {
            self.sessions.write().await.remove(&session_id);
        }
        let outcome = outcome?;

        let elapsed = started.elapsed();
        let text = match outcome.text {
            Some(text) if elapsed >= self.latency_bound => {
                tracing::warn!(
                    session_id = %session_id,
                    elapsed_ms = %elapsed.as_millis(),
                    "Reply missed the latency bound, sending to speech sink"
                );
                if let Err(e) = self.sink.say(&session_id, &text).await {
                    tracing::error!(session_id = %session_id, error = %e, "Speech sink failed");
                }
                None
            }
            text => text,
        };

        Ok(TurnReply {
            session_id,
            text,
            action: outcome.action,
        })
    }
}
