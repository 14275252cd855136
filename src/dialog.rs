//! Trip dialog state machine
//!
//! Pure transitions in the Elm style: `transition` takes the current state
//! and an event and returns the next state plus the effects the runtime
//! must carry out. Nothing in here performs I/O.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::{Effect, Prompt, TripReport, Utterance};
pub use event::Event;
pub use state::{DialogContext, DialogState, FailureReason, Flow};
pub use transition::{transition, TransitionError};
