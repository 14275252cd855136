//! Effects produced by dialog transitions

use super::state::{FailureReason, Flow};
use crate::route::{RouteRequest, RouteSummary, TravelMode};
use chrono::{DateTime, FixedOffset};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Speak to the user
    Say(Utterance),

    /// Keep the session open for one of `intent_filter`
    ContinueSession { intent_filter: Vec<String> },

    /// Ask the routing backend; the runtime answers with a route event
    RequestRoute(RouteRequest),

    EndSession,
}

impl Effect {
    pub fn say(utterance: Utterance) -> Self {
        Effect::Say(utterance)
    }

    pub fn continue_with(intent_filter: Vec<String>) -> Self {
        Effect::ContinueSession { intent_filter }
    }
}

/// Clarifying questions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Prompt {
    NoOriginAddress,
    NoArrivalTime,
    NoDepartureTime,
}

/// What to say, before it is put into words
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Utterance {
    Prompt { prompt: Prompt },
    SameLocations,
    Trip { report: Box<TripReport> },
    Failure { reason: FailureReason },
}

impl Utterance {
    pub fn prompt(prompt: Prompt) -> Self {
        Utterance::Prompt { prompt }
    }

    pub fn failure(reason: FailureReason) -> Self {
        Utterance::Failure { reason }
    }

    pub fn trip(report: TripReport) -> Self {
        Utterance::Trip {
            report: Box::new(report),
        }
    }
}

/// Answer to a resolved trip question
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripReport {
    pub flow: Flow,
    /// Mode the route was requested with
    pub travel_mode: TravelMode,
    /// Mode the user explicitly asked for
    pub requested_mode: Option<TravelMode>,
    pub summary: RouteSummary,
    pub departure_time: Option<DateTime<FixedOffset>>,
    pub arrival_time: Option<DateTime<FixedOffset>>,
}
