//! Dialog state types

use crate::config::{ConfigError, DialogSettings, Locations};
use crate::route::TravelMode;
use crate::slot::{ARRIVAL_TIME, DEPARTURE_TIME};
use chrono::{DateTime, FixedOffset};
use serde::Serialize;

/// Intents that end a session from any awaiting state
pub const CANCEL_INTENTS: [&str; 2] = ["Cancel", "Stop"];

/// Which question the user asked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Flow {
    /// Step-by-step directions
    Directions,
    /// How long the trip takes
    NavigationTime,
    /// When to leave to arrive on time
    DepartureTime,
    /// When the user arrives if leaving at a given time
    ArrivalTime,
}

impl Flow {
    /// Flow started by an intent's local name
    pub fn from_intent(local_name: &str) -> Option<Self> {
        match local_name {
            "GetDirections" => Some(Flow::Directions),
            "GetNavigationTime" => Some(Flow::NavigationTime),
            "GetDepartureTime" => Some(Flow::DepartureTime),
            "GetArrivalTime" => Some(Flow::ArrivalTime),
            _ => None,
        }
    }

    /// The time the user has to give before a route can be requested
    pub fn required_time(self) -> Option<TimeSlot> {
        match self {
            Flow::Directions | Flow::NavigationTime => None,
            Flow::DepartureTime => Some(TimeSlot::Arrival),
            Flow::ArrivalTime => Some(TimeSlot::Departure),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSlot {
    Arrival,
    Departure,
}

impl TimeSlot {
    pub fn slot_name(self) -> &'static str {
        match self {
            TimeSlot::Arrival => ARRIVAL_TIME,
            TimeSlot::Departure => DEPARTURE_TIME,
        }
    }

    pub fn awaiting(self) -> Awaiting {
        match self {
            TimeSlot::Arrival => Awaiting::ArrivalTime,
            TimeSlot::Departure => Awaiting::DepartureTime,
        }
    }

    /// Reason given when the clarification budget runs out with no time at all
    pub fn missing_reason(self) -> FailureReason {
        match self {
            TimeSlot::Arrival => FailureReason::NoArrivalTime,
            TimeSlot::Departure => FailureReason::NoDepartureTime,
        }
    }
}

/// The piece of information an awaiting state asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Awaiting {
    Origin,
    ArrivalTime,
    DepartureTime,
}

impl Awaiting {
    /// Continuation intent that answers the question
    pub fn elicit_intent(self) -> &'static str {
        match self {
            Awaiting::Origin => "ElicitOrigin",
            Awaiting::ArrivalTime => "ElicitArrivalTime",
            Awaiting::DepartureTime => "ElicitDepartureTime",
        }
    }

    /// Intents the session accepts while waiting for the answer
    pub fn intent_filter(self) -> Vec<String> {
        std::iter::once(self.elicit_intent())
            .chain(CANCEL_INTENTS)
            .map(str::to_string)
            .collect()
    }
}

/// Slot values gathered so far, plus the clarification budget left
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnownSlots {
    /// Resolved origin query (aliases already expanded)
    pub location_from: Option<String>,
    pub location_to: Option<String>,
    /// Only set when the user asked for a mode
    pub travel_mode: Option<TravelMode>,
    pub arrival_time: Option<DateTime<FixedOffset>>,
    pub departure_time: Option<DateTime<FixedOffset>>,
    pub depth: u32,
}

impl KnownSlots {
    pub fn new(depth: u32) -> Self {
        Self {
            location_from: None,
            location_to: None,
            travel_mode: None,
            arrival_time: None,
            departure_time: None,
            depth,
        }
    }

    pub fn time(&self, slot: TimeSlot) -> Option<DateTime<FixedOffset>> {
        match slot {
            TimeSlot::Arrival => self.arrival_time,
            TimeSlot::Departure => self.departure_time,
        }
    }

    pub fn set_time(&mut self, slot: TimeSlot, value: DateTime<FixedOffset>) {
        match slot {
            TimeSlot::Arrival => self.arrival_time = Some(value),
            TimeSlot::Departure => self.departure_time = Some(value),
        }
    }

    /// Mode used for the request: the one asked for, else transit
    pub fn effective_mode(&self) -> TravelMode {
        self.travel_mode.unwrap_or(TravelMode::Transit)
    }

    /// One clarification turn consumed
    #[must_use]
    pub fn spend_retry(mut self) -> Self {
        self.depth = self.depth.saturating_sub(1);
        self
    }
}

/// Why a session ended without an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureReason {
    #[serde(rename = "intentNotRecognized")]
    IntentNotRecognized,
    #[serde(rename = "slotsNotRecognized")]
    SlotsNotRecognized,
    #[serde(rename = "noArrivalTime")]
    NoArrivalTime,
    #[serde(rename = "noDepartureTime")]
    NoDepartureTime,
    #[serde(rename = "APIRequest")]
    ApiRequest,
    #[serde(rename = "APIResponse")]
    ApiResponse,
    #[serde(rename = "noCurrentAddress")]
    NoCurrentAddress,
    #[serde(rename = "badCurrentAddress")]
    BadCurrentAddress,
    #[serde(rename = "noHomeAddress")]
    NoHomeAddress,
    #[serde(rename = "noWorkAddress")]
    NoWorkAddress,
}

impl FailureReason {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureReason::IntentNotRecognized => "intentNotRecognized",
            FailureReason::SlotsNotRecognized => "slotsNotRecognized",
            FailureReason::NoArrivalTime => "noArrivalTime",
            FailureReason::NoDepartureTime => "noDepartureTime",
            FailureReason::ApiRequest => "APIRequest",
            FailureReason::ApiResponse => "APIResponse",
            FailureReason::NoCurrentAddress => "noCurrentAddress",
            FailureReason::BadCurrentAddress => "badCurrentAddress",
            FailureReason::NoHomeAddress => "noHomeAddress",
            FailureReason::NoWorkAddress => "noWorkAddress",
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&ConfigError> for FailureReason {
    fn from(error: &ConfigError) -> Self {
        match error {
            ConfigError::NoCurrentAddress => FailureReason::NoCurrentAddress,
            ConfigError::BadCurrentAddress(_) => FailureReason::BadCurrentAddress,
            ConfigError::NoHomeAddress => FailureReason::NoHomeAddress,
            ConfigError::NoWorkAddress => FailureReason::NoWorkAddress,
        }
    }
}

/// Dialog state
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DialogState {
    /// No intent handled yet
    #[default]
    Start,

    /// Asked where the trip starts
    AwaitingOrigin { flow: Flow, known: KnownSlots },

    /// Asked when the user wants to arrive
    AwaitingArrivalTime { flow: Flow, known: KnownSlots },

    /// Asked when the user wants to leave
    AwaitingDepartureTime { flow: Flow, known: KnownSlots },

    /// Route requested, waiting for the backend
    Routing { flow: Flow, known: KnownSlots },

    /// Answer given
    Resolved,

    /// Gave up, with the reason spoken to the user
    Failed { reason: FailureReason },

    /// User cancelled
    Cancelled,
}

impl DialogState {
    /// Build the awaiting state for `awaiting`
    pub fn awaiting_for(awaiting: Awaiting, flow: Flow, known: KnownSlots) -> Self {
        match awaiting {
            Awaiting::Origin => DialogState::AwaitingOrigin { flow, known },
            Awaiting::ArrivalTime => DialogState::AwaitingArrivalTime { flow, known },
            Awaiting::DepartureTime => DialogState::AwaitingDepartureTime { flow, known },
        }
    }

    /// What this state is waiting to hear, if it is waiting on the user
    pub fn awaiting(&self) -> Option<(Awaiting, Flow, &KnownSlots)> {
        match self {
            DialogState::AwaitingOrigin { flow, known } => Some((Awaiting::Origin, *flow, known)),
            DialogState::AwaitingArrivalTime { flow, known } => Some((Awaiting::ArrivalTime, *flow, known)),
            DialogState::AwaitingDepartureTime { flow, known } => Some((Awaiting::DepartureTime, *flow, known)),
            _ => None,
        }
    }

    /// The continuation this state is registered for
    pub fn pending(&self) -> Option<Awaiting> {
        self.awaiting().map(|(awaiting, _, _)| awaiting)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DialogState::Resolved | DialogState::Failed { .. } | DialogState::Cancelled
        )
    }
}

/// Immutable inputs for one session
#[derive(Debug, Clone)]
pub struct DialogContext {
    pub session_id: String,
    pub settings: DialogSettings,
    pub locations: Locations,
}

impl DialogContext {
    pub fn new(session_id: impl Into<String>, settings: DialogSettings, locations: Locations) -> Self {
        Self {
            session_id: session_id.into(),
            settings,
            locations,
        }
    }
}
