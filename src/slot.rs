//! Recognized intents and slots
//!
//! Slots arrive pre-scored from the NLU engine. This module only decides
//! which candidate to trust.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

pub const LOCATION_FROM: &str = "location_from";
pub const LOCATION_TO: &str = "location_to";
pub const TRAVEL_MODE: &str = "travel_mode";
pub const ARRIVAL_TIME: &str = "arrival_time";
pub const DEPARTURE_TIME: &str = "departure_time";

/// Wire format used by the NLU engine for instants
const INSTANT_FORMAT: &str = "%Y-%m-%d %H:%M:%S %:z";

/// One recognized intent message, as delivered by the transport
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentMessage {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub input: String,
    pub intent: Intent,
    #[serde(default)]
    pub slots: Vec<Slot>,
}

impl IntentMessage {
    /// Copy of this message with every slot guess dropped
    pub fn without_slots(&self) -> Self {
        Self {
            slots: Vec::new(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intent {
    pub intent_name: String,
    pub confidence_score: f64,
}

impl Intent {
    /// Intent name without its namespace (`ns:GetDirections` -> `GetDirections`)
    pub fn local_name(&self) -> &str {
        self.intent_name
            .rsplit_once(':')
            .map_or(self.intent_name.as_str(), |(_, name)| name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub slot_name: String,
    #[serde(default)]
    pub entity: String,
    pub confidence_score: f64,
    #[serde(default)]
    pub raw_value: String,
    pub value: SlotValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum SlotValue {
    InstantTime {
        value: String,
    },
    TimeInterval {
        #[serde(default)]
        from: Option<String>,
        #[serde(default)]
        to: Option<String>,
    },
    Custom {
        value: String,
    },
    PlainText {
        value: String,
    },
}

impl SlotValue {
    /// Textual value for custom and plain-text slots
    pub fn text(&self) -> Option<&str> {
        match self {
            SlotValue::Custom { value } | SlotValue::PlainText { value } => Some(value),
            SlotValue::InstantTime { .. } | SlotValue::TimeInterval { .. } => None,
        }
    }

    /// Usable instant for time slots. Intervals resolve to `from`, else `to`.
    pub fn instant(&self) -> Option<DateTime<FixedOffset>> {
        match self {
            SlotValue::InstantTime { value } => parse_instant(value),
            SlotValue::TimeInterval { from, to } => from
                .as_deref()
                .and_then(parse_instant)
                .or_else(|| to.as_deref().and_then(parse_instant)),
            SlotValue::Custom { .. } | SlotValue::PlainText { .. } => None,
        }
    }
}

/// Parse an instant in the NLU wire format, falling back to RFC 3339
pub fn parse_instant(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(raw, INSTANT_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
}

/// How a named slot shows up in a message
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SlotPresence<'a> {
    /// Best candidate met the threshold
    Accepted(&'a Slot),
    /// Candidates exist but none met the threshold
    NotUnderstood,
    Absent,
}

impl<'a> SlotPresence<'a> {
    pub fn accepted(self) -> Option<&'a Slot> {
        match self {
            SlotPresence::Accepted(slot) => Some(slot),
            SlotPresence::NotUnderstood | SlotPresence::Absent => None,
        }
    }

    pub fn is_not_understood(self) -> bool {
        matches!(self, SlotPresence::NotUnderstood)
    }
}

/// Classify the most confident candidate named `name`
pub fn presence<'a>(message: &'a IntentMessage, name: &str, threshold: f64) -> SlotPresence<'a> {
    let best = message
        .slots
        .iter()
        .filter(|slot| slot.slot_name == name)
        .max_by(|a, b| a.confidence_score.total_cmp(&b.confidence_score));

    match best {
        Some(slot) if slot.confidence_score >= threshold => SlotPresence::Accepted(slot),
        Some(_) => SlotPresence::NotUnderstood,
        None => SlotPresence::Absent,
    }
}

/// Most confident candidate named `name`, if it meets `threshold`
pub fn accepted_slot<'a>(message: &'a IntentMessage, name: &str, threshold: f64) -> Option<&'a Slot> {
    presence(message, name, threshold).accepted()
}
