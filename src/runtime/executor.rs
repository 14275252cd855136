//! Turn executor
//!
//! Runs one user turn through the state machine, carrying out effects
//! until the dialog either asks something back or ends.

use super::traits::{RoutingClient, SpeechComposer};
use super::SessionAction;
use crate::dialog::{transition, DialogContext, DialogState, Effect, Event, TransitionError};

/// One conversation: its immutable context and current state
#[derive(Debug)]
pub struct DialogSession {
    pub context: DialogContext,
    pub state: DialogState,
}

/// What one turn produced, before latency routing
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub text: Option<String>,
    pub action: SessionAction,
}

impl DialogSession {
    pub fn new(context: DialogContext) -> Self {
        Self {
            context,
            state: DialogState::Start,
        }
    }

    /// Process `event` and every event its effects generate
    pub async fn process<R, C>(
        &mut self,
        event: Event,
        routing: &R,
        composer: &C,
    ) -> Result<TurnOutcome, TransitionError>
    where
        R: RoutingClient + ?Sized,
        C: SpeechComposer + ?Sized,
    {
        let mut spoken = Vec::new();
        let mut action = SessionAction::End;

        // Process events in a loop - no recursion
        let mut events_to_process = vec![event];

        while let Some(current_event) = events_to_process.pop() {
            let result = transition(&self.state, &self.context, current_event)?;

            let old_state = std::mem::replace(&mut self.state, result.new_state);
            tracing::debug!(
                session_id = %self.context.session_id,
                from = ?old_state,
                to = ?self.state,
                "Dialog transition"
            );

            for effect in result.effects {
                match effect {
                    Effect::Say(utterance) => spoken.push(composer.compose(&utterance)),
                    Effect::ContinueSession { intent_filter } => {
                        action = SessionAction::Continue { intent_filter };
                    }
                    Effect::EndSession => action = SessionAction::End,
                    Effect::RequestRoute(request) => {
                        let generated = match routing.calculate_route(&request).await {
                            Ok(response) => Event::RouteReady {
                                response: Box::new(response),
                            },
                            Err(error) => Event::RouteFailed { error },
                        };
                        events_to_process.push(generated);
                    }
                }
            }
        }

        if let DialogState::Failed { reason } = &self.state {
            tracing::info!(session_id = %self.context.session_id, reason = %reason, "Dialog failed");
        }

        Ok(TurnOutcome {
            text: (!spoken.is_empty()).then(|| spoken.join(" ")),
            action,
        })
    }
}
