//! Pure state transition function

use super::effect::{Effect, Prompt, TripReport, Utterance};
use super::event::Event;
use super::state::{Awaiting, DialogContext, DialogState, FailureReason, Flow, KnownSlots, TimeSlot};
use crate::backend::BackendErrorKind;
use crate::config::{Alias, ConfigError, Locations};
use crate::route::{summarize, RouteRequest, RouteSummary, TravelMode};
use crate::slot::{self, IntentMessage, SlotPresence, LOCATION_FROM, LOCATION_TO, TRAVEL_MODE};
use chrono::{DateTime, Duration, FixedOffset, TimeZone};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: DialogState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: DialogState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }

    /// Speak the reason and end the session
    fn failed(reason: FailureReason) -> Self {
        Self::new(DialogState::Failed { reason })
            .with_effects([Effect::say(Utterance::failure(reason)), Effect::EndSession])
    }
}

#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("Session already ended")]
    SessionEnded,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
///
/// Given the same inputs it always produces the same outputs. Backend calls
/// and speech are described as effects for the runtime to carry out.
pub fn transition(
    state: &DialogState,
    ctx: &DialogContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    if let Some((awaiting, flow, known)) = state.awaiting() {
        return match event {
            Event::Elicited { message } => {
                if message.intent.confidence_score < ctx.settings.intent_filter_probability_threshold {
                    return Ok(TransitionResult::failed(FailureReason::IntentNotRecognized));
                }
                Ok(evaluate(ctx, flow, known.clone().spend_retry(), &message, Some(awaiting)))
            }
            Event::NotRecognized { message } => Ok(evaluate(
                ctx,
                flow,
                known.clone().spend_retry(),
                &message.without_slots(),
                Some(awaiting),
            )),
            Event::Cancel => {
                Ok(TransitionResult::new(DialogState::Cancelled).with_effect(Effect::EndSession))
            }
            other => Err(TransitionError::InvalidTransition(format!(
                "unexpected event {other:?} while awaiting {awaiting:?}"
            ))),
        };
    }

    match (state, event) {
        (DialogState::Start, Event::Start { flow, message }) => Ok(evaluate(
            ctx,
            flow,
            KnownSlots::new(ctx.settings.retry_budget),
            &message,
            None,
        )),

        (DialogState::Routing { flow, known }, Event::RouteReady { response }) => {
            let Some((origin, destination)) = known.location_from.as_deref().zip(known.location_to.as_deref())
            else {
                return Err(TransitionError::InvalidTransition(
                    "routing without both locations".to_string(),
                ));
            };
            let outcome = summarize(&response, origin, destination, known.travel_mode, &ctx.locations)
                .ok()
                .and_then(|summary| report(*flow, known, summary));
            Ok(match outcome {
                Some(report) => TransitionResult::new(DialogState::Resolved)
                    .with_effects([Effect::say(Utterance::trip(report)), Effect::EndSession]),
                None => TransitionResult::failed(FailureReason::ApiResponse),
            })
        }

        (DialogState::Routing { .. }, Event::RouteFailed { error }) => Ok(TransitionResult::failed(match error.kind {
            BackendErrorKind::Request => FailureReason::ApiRequest,
            BackendErrorKind::Response => FailureReason::ApiResponse,
        })),

        (DialogState::Resolved | DialogState::Failed { .. } | DialogState::Cancelled, _) => {
            Err(TransitionError::SessionEnded)
        }

        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "No transition from {state:?} with event {event:?}"
        ))),
    }
}

/// Run one pass of the dialog over everything known so far
fn evaluate(
    ctx: &DialogContext,
    flow: Flow,
    mut known: KnownSlots,
    message: &IntentMessage,
    awaiting: Option<Awaiting>,
) -> TransitionResult {
    let threshold = ctx.settings.slot_confidence_threshold;

    let current = match ctx.locations.current() {
        Ok((_, place)) => place.query(),
        Err(error) => return TransitionResult::failed(FailureReason::from(&error)),
    };

    // Merge this turn's slots into what is already known
    if known.location_to.is_none() {
        if let Some(text) = accepted_text(message, LOCATION_TO, threshold) {
            match resolve_place(text, &ctx.locations) {
                Ok(place) => known.location_to = Some(place),
                Err(error) => return TransitionResult::failed(FailureReason::from(&error)),
            }
        }
    }

    let origin = slot::presence(message, LOCATION_FROM, threshold);
    if known.location_from.is_none() {
        match origin {
            SlotPresence::Accepted(found) => {
                let text = found.value.text().unwrap_or(&found.raw_value);
                match resolve_place(text, &ctx.locations) {
                    Ok(place) => known.location_from = Some(place),
                    Err(error) => return TransitionResult::failed(FailureReason::from(&error)),
                }
            }
            // The device location only stands in on the opening turn
            SlotPresence::Absent if awaiting.is_none() => known.location_from = Some(current),
            SlotPresence::Absent | SlotPresence::NotUnderstood => {}
        }
    }

    if known.travel_mode.is_none() {
        known.travel_mode = accepted_text(message, TRAVEL_MODE, threshold).and_then(TravelMode::from_slot_value);
    }

    let required_time = flow.required_time();
    let time = required_time.map(|needed| slot::presence(message, needed.slot_name(), threshold));
    if let (Some(needed), Some(SlotPresence::Accepted(found))) = (required_time, time) {
        if known.time(needed).is_none() {
            if let Some(instant) = found.value.instant() {
                known.set_time(needed, instant);
            }
        }
    }

    // Decide
    if known.location_to.is_none() {
        return TransitionResult::failed(FailureReason::IntentNotRecognized);
    }

    let time_missing = required_time.is_some_and(|needed| known.time(needed).is_none());
    if known.location_from.is_none() && origin.is_not_understood() && time_missing {
        return TransitionResult::failed(FailureReason::IntentNotRecognized);
    }

    if known.location_from.is_none() {
        return ask_or_give_up(flow, known, Awaiting::Origin, FailureReason::SlotsNotRecognized);
    }

    if let Some(needed) = required_time.filter(|_| time_missing) {
        let exhausted = if time.is_some_and(SlotPresence::is_not_understood) {
            FailureReason::SlotsNotRecognized
        } else {
            needed.missing_reason()
        };
        return ask_or_give_up(flow, known, needed.awaiting(), exhausted);
    }

    match (known.location_from.as_deref(), known.location_to.as_deref()) {
        (Some(from), Some(to)) if same_place(from, to) => TransitionResult::new(DialogState::Resolved)
            .with_effects([Effect::say(Utterance::SameLocations), Effect::EndSession]),
        (Some(from), Some(to)) => {
            let request = route_request(flow, &known, from, to);
            TransitionResult::new(DialogState::Routing { flow, known }).with_effect(Effect::RequestRoute(request))
        }
        _ => TransitionResult::failed(FailureReason::IntentNotRecognized),
    }
}

/// Ask a clarifying question, or fail once the budget is spent
fn ask_or_give_up(flow: Flow, known: KnownSlots, awaiting: Awaiting, exhausted: FailureReason) -> TransitionResult {
    if known.depth == 0 {
        return TransitionResult::failed(exhausted);
    }
    let prompt = match awaiting {
        Awaiting::Origin => Prompt::NoOriginAddress,
        Awaiting::ArrivalTime => Prompt::NoArrivalTime,
        Awaiting::DepartureTime => Prompt::NoDepartureTime,
    };
    TransitionResult::new(DialogState::awaiting_for(awaiting, flow, known)).with_effects([
        Effect::say(Utterance::prompt(prompt)),
        Effect::continue_with(awaiting.intent_filter()),
    ])
}

fn accepted_text<'a>(message: &'a IntentMessage, name: &str, threshold: f64) -> Option<&'a str> {
    slot::accepted_slot(message, name, threshold).map(|found| found.value.text().unwrap_or(&found.raw_value))
}

/// Expand `home`/`work` into the configured address
fn resolve_place(text: &str, locations: &Locations) -> Result<String, ConfigError> {
    match Alias::parse(text) {
        Some(alias) => Ok(locations.place(alias)?.query()),
        None => Ok(text.trim().to_string()),
    }
}

/// Either location names the other
fn same_place(from: &str, to: &str) -> bool {
    let from = from.trim().to_lowercase();
    let to = to.trim().to_lowercase();
    from.contains(&to) || to.contains(&from)
}

fn route_request(flow: Flow, known: &KnownSlots, origin: &str, destination: &str) -> RouteRequest {
    let time = flow.required_time().and_then(|needed| known.time(needed));
    RouteRequest {
        origin: origin.to_string(),
        destination: destination.to_string(),
        travel_mode: known.effective_mode(),
        departure_time: time.filter(|_| flow.required_time() == Some(TimeSlot::Departure)),
        arrival_time: time.filter(|_| flow.required_time() == Some(TimeSlot::Arrival)),
    }
}

/// Attach the times the flow answers with; `None` when the route lacks them
fn report(flow: Flow, known: &KnownSlots, summary: RouteSummary) -> Option<TripReport> {
    let mode = known.effective_mode();
    let trip_length = Duration::try_seconds(i64::try_from(summary.duration).ok()?)?;

    let (departure_time, arrival_time) = match flow.required_time() {
        None => (None, None),
        Some(needed) => {
            let given = known.time(needed)?;
            let offset = *given.offset();
            if mode.is_transit() {
                // Transit legs run to a timetable, so take the backend's times
                let departure = epoch_in(summary.departure_epoch?, offset)?;
                let arrival = epoch_in(summary.arrival_epoch?, offset)?;
                (Some(departure), Some(arrival))
            } else if needed == TimeSlot::Arrival {
                (Some(given.checked_sub_signed(trip_length)?), Some(given))
            } else {
                (Some(given), Some(given.checked_add_signed(trip_length)?))
            }
        }
    };

    Some(TripReport {
        flow,
        travel_mode: mode,
        requested_mode: known.travel_mode,
        summary,
        departure_time,
        arrival_time,
    })
}

fn epoch_in(epoch: i64, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    offset.timestamp_opt(epoch, 0).single()
}
