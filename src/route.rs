//! Routing backend data model
//!
//! Raw routes mirror the Directions API JSON. `aggregate` turns them into
//! a handful of speakable segments.

pub mod aggregate;

#[cfg(test)]
mod proptests;

pub use aggregate::{summarize, RouteSummary, Segment, SegmentMode};

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Broad family of a travel mode, used to compare requested and returned routes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeClass {
    Walking,
    Driving,
    Bicycling,
    Transit,
}

/// Travel mode as requested by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelMode {
    Driving,
    Walking,
    Bicycling,
    Transit,
    Bus,
    Train,
    Subway,
    Tram,
}

impl TravelMode {
    /// Parse the value of a `travel_mode` slot
    pub fn from_slot_value(raw: &str) -> Option<Self> {
        let mode = match raw.trim().to_lowercase().as_str() {
            "car" | "driving" | "drive" => TravelMode::Driving,
            "walking" | "walk" | "foot" | "on foot" => TravelMode::Walking,
            "bicycling" | "bicycle" | "bike" | "cycling" => TravelMode::Bicycling,
            "transit" | "public transport" | "public transportation" => TravelMode::Transit,
            "bus" => TravelMode::Bus,
            "train" | "rail" => TravelMode::Train,
            "metro" | "subway" | "tube" | "underground" => TravelMode::Subway,
            "tram" | "light rail" => TravelMode::Tram,
            _ => return None,
        };
        Some(mode)
    }

    pub fn class(self) -> ModeClass {
        match self {
            TravelMode::Driving => ModeClass::Driving,
            TravelMode::Walking => ModeClass::Walking,
            TravelMode::Bicycling => ModeClass::Bicycling,
            TravelMode::Transit | TravelMode::Bus | TravelMode::Train | TravelMode::Subway | TravelMode::Tram => {
                ModeClass::Transit
            }
        }
    }

    pub fn is_transit(self) -> bool {
        self.class() == ModeClass::Transit
    }

    /// `mode` query parameter
    pub fn api_mode(self) -> &'static str {
        match self.class() {
            ModeClass::Driving => "driving",
            ModeClass::Walking => "walking",
            ModeClass::Bicycling => "bicycling",
            ModeClass::Transit => "transit",
        }
    }

    /// `transit_mode` query parameter, for vehicle-specific requests
    pub fn api_transit_mode(self) -> Option<&'static str> {
        match self {
            TravelMode::Bus => Some("bus"),
            TravelMode::Train => Some("train"),
            TravelMode::Subway => Some("subway"),
            TravelMode::Tram => Some("tram"),
            _ => None,
        }
    }
}

/// One routing request
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    pub origin: String,
    pub destination: String,
    pub travel_mode: TravelMode,
    pub departure_time: Option<DateTime<FixedOffset>>,
    pub arrival_time: Option<DateTime<FixedOffset>>,
}

// Directions API payload

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default)]
    pub routes: Vec<Route>,
}

impl RouteResponse {
    /// First leg of the first route, which is all a spoken answer uses
    pub fn first_leg(&self) -> Option<&Leg> {
        self.routes.first().and_then(|route| route.legs.first())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Route {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub legs: Vec<Leg>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Leg {
    pub duration: TextValue,
    pub distance: TextValue,
    #[serde(default)]
    pub start_address: String,
    #[serde(default)]
    pub end_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_time: Option<TimeValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival_time: Option<TimeValue>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Quantity with its display text (seconds or metres)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextValue {
    #[serde(default)]
    pub text: String,
    pub value: u64,
}

impl TextValue {
    pub fn new(value: u64) -> Self {
        Self {
            text: String::new(),
            value,
        }
    }
}

/// Wall-clock time as epoch seconds
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeValue {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub time_zone: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub travel_mode: StepMode,
    pub duration: TextValue,
    pub distance: TextValue,
    #[serde(default)]
    pub html_instructions: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transit_details: Option<TransitDetails>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepMode {
    Walking,
    Driving,
    Bicycling,
    Transit,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitDetails {
    #[serde(default)]
    pub headsign: Option<String>,
    #[serde(default)]
    pub num_stops: Option<u32>,
    #[serde(default)]
    pub departure_stop: Option<Stop>,
    #[serde(default)]
    pub arrival_stop: Option<Stop>,
    #[serde(default)]
    pub line: TransitLine,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitLine {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub vehicle: Vehicle,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    #[serde(default, rename = "type")]
    pub kind: String,
}
