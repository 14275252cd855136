//! Events fed to the dialog state machine

use super::state::{Awaiting, DialogState, Flow, CANCEL_INTENTS};
use crate::backend::BackendError;
use crate::route::RouteResponse;
use crate::slot::IntentMessage;

#[derive(Debug, Clone)]
pub enum Event {
    /// First intent of a session
    Start { flow: Flow, message: IntentMessage },

    /// Answer to the pending question
    Elicited { message: IntentMessage },

    /// Something arrived that matches no registered continuation
    NotRecognized { message: IntentMessage },

    Cancel,

    // Routing backend
    RouteReady { response: Box<RouteResponse> },
    RouteFailed { error: BackendError },
}

impl Event {
    /// Resolve the single continuation an incoming message triggers in `state`.
    ///
    /// Returns `None` when the message cannot start or continue a session.
    pub fn from_message(state: &DialogState, message: IntentMessage) -> Option<Self> {
        let name = message.intent.local_name();
        match state.pending() {
            None if matches!(state, DialogState::Start) => {
                Flow::from_intent(name).map(|flow| Event::Start { flow, message })
            }
            None => None,
            Some(awaiting) => Some(continuation(awaiting, message)),
        }
    }
}

fn continuation(awaiting: Awaiting, message: IntentMessage) -> Event {
    let name = message.intent.local_name();
    if name == awaiting.elicit_intent() {
        Event::Elicited { message }
    } else if CANCEL_INTENTS.contains(&name) {
        Event::Cancel
    } else {
        Event::NotRecognized { message }
    }
}
