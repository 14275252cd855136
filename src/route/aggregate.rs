//! Route aggregation
//!
//! Collapses block-by-block steps into "walk, then take the metro, then
//! walk" and flags routes that ignored the requested travel mode.

use super::{Leg, ModeClass, RouteResponse, Step, StepMode, TransitDetails, TravelMode};
use crate::config::Locations;
use serde::Serialize;
use thiserror::Error;

/// Transit vehicle families worth naming out loud
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleKind {
    Subway,
    Bus,
    Train,
    Tram,
    Ferry,
    Other,
}

impl VehicleKind {
    /// Map a Directions API vehicle type
    pub fn from_api(kind: &str) -> Self {
        match kind {
            "SUBWAY" | "METRO_RAIL" => VehicleKind::Subway,
            "BUS" | "INTERCITY_BUS" | "TROLLEYBUS" | "SHARE_TAXI" => VehicleKind::Bus,
            "RAIL" | "HEAVY_RAIL" | "COMMUTER_TRAIN" | "HIGH_SPEED_TRAIN" | "LONG_DISTANCE_TRAIN" => {
                VehicleKind::Train
            }
            "TRAM" | "MONORAIL" => VehicleKind::Tram,
            "FERRY" => VehicleKind::Ferry,
            _ => VehicleKind::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", content = "vehicle", rename_all = "snake_case")]
pub enum SegmentMode {
    Walking,
    Driving,
    Bicycling,
    Transit(VehicleKind),
}

impl SegmentMode {
    fn of(step: &Step) -> Self {
        match step.travel_mode {
            StepMode::Walking | StepMode::Unknown => SegmentMode::Walking,
            StepMode::Driving => SegmentMode::Driving,
            StepMode::Bicycling => SegmentMode::Bicycling,
            StepMode::Transit => SegmentMode::Transit(
                step.transit_details
                    .as_ref()
                    .map_or(VehicleKind::Other, |d| VehicleKind::from_api(&d.line.vehicle.kind)),
            ),
        }
    }

    pub fn class(self) -> ModeClass {
        match self {
            SegmentMode::Walking => ModeClass::Walking,
            SegmentMode::Driving => ModeClass::Driving,
            SegmentMode::Bicycling => ModeClass::Bicycling,
            SegmentMode::Transit(_) => ModeClass::Transit,
        }
    }
}

/// Transit line a segment rides
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineInfo {
    pub name: String,
    pub headsign: Option<String>,
    pub departure_stop: Option<String>,
    pub arrival_stop: Option<String>,
    pub num_stops: Option<u32>,
}

impl LineInfo {
    fn from_details(details: &TransitDetails) -> Option<Self> {
        let name = details
            .line
            .short_name
            .clone()
            .or_else(|| details.line.name.clone())?;
        Some(Self {
            name,
            headsign: details.headsign.clone(),
            departure_stop: details.departure_stop.as_ref().map(|s| s.name.clone()),
            arrival_stop: details.arrival_stop.as_ref().map(|s| s.name.clone()),
            num_stops: details.num_stops,
        })
    }

    fn same_line(&self, other: &LineInfo) -> bool {
        self.name == other.name && self.headsign == other.headsign
    }

    /// Ride on through `next`'s stops
    fn extend(&mut self, next: &LineInfo) {
        self.arrival_stop.clone_from(&next.arrival_stop);
        self.num_stops = match (self.num_stops, next.num_stops) {
            (Some(a), Some(b)) => Some(a.saturating_add(b)),
            _ => None,
        };
    }
}

/// A maximal run of same-mode steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub mode: SegmentMode,
    /// Seconds
    pub duration: u64,
    /// Metres
    pub distance: u64,
    pub line: Option<LineInfo>,
}

impl Segment {
    fn start(step: &Step) -> Self {
        Self {
            mode: SegmentMode::of(step),
            duration: step.duration.value,
            distance: step.distance.value,
            line: step.transit_details.as_ref().and_then(LineInfo::from_details),
        }
    }

    fn absorb(&mut self, step: &Step) {
        self.duration = self.duration.saturating_add(step.duration.value);
        self.distance = self.distance.saturating_add(step.distance.value);
        let next = step.transit_details.as_ref().and_then(LineInfo::from_details);
        self.line = match (self.line.take(), next) {
            (Some(mut current), Some(next)) if current.same_line(&next) => {
                current.extend(&next);
                Some(current)
            }
            // Differing lines on one segment cannot be named as one ride
            _ => None,
        };
    }
}

/// Merge consecutive same-mode steps, keeping their order
pub fn aggregate(steps: &[Step]) -> Vec<Segment> {
    let mut segments: Vec<Segment> = Vec::new();
    for step in steps {
        match segments.last_mut() {
            Some(current) if current.mode == SegmentMode::of(step) => current.absorb(step),
            _ => segments.push(Segment::start(step)),
        }
    }
    segments
}

/// Mode class of the longest vehicle segment, walking if the trip is on foot
pub fn dominant_mode(segments: &[Segment]) -> ModeClass {
    segments
        .iter()
        .filter(|s| s.mode != SegmentMode::Walking)
        .max_by_key(|s| s.duration)
        .map_or(ModeClass::Walking, |s| s.mode.class())
}

/// Labels for the two ends of the trip
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Addresses {
    pub origin: String,
    pub destination: String,
}

fn address_label(resolved: &str, geocoded: &str, locations: &Locations) -> String {
    let source = if geocoded.is_empty() { resolved } else { geocoded };
    let alias = locations
        .alias_for(resolved)
        .or_else(|| locations.alias_for(source));
    match alias {
        Some(alias) => alias.label().to_string(),
        None => source.split(',').next().unwrap_or(source).trim().to_string(),
    }
}

/// Prefer `home`/`work`, else the street part of the geocoded address
pub fn full_addresses(origin: &str, destination: &str, leg: &Leg, locations: &Locations) -> Addresses {
    Addresses {
        origin: address_label(origin, &leg.start_address, locations),
        destination: address_label(destination, &leg.end_address, locations),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregateError {
    #[error("routing backend returned status {status}: {message}")]
    Status { status: String, message: String },
    #[error("routing backend returned no route")]
    NoRoute,
}

/// Everything the speech layer needs about one route
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteSummary {
    pub segments: Vec<Segment>,
    pub addresses: Addresses,
    /// Seconds
    pub duration: u64,
    /// Metres
    pub distance: u64,
    pub dominant_mode: ModeClass,
    /// The backend substituted another mode for the one the user asked for
    pub mode_mismatch: bool,
    /// Epoch seconds, transit legs only
    pub departure_epoch: Option<i64>,
    pub arrival_epoch: Option<i64>,
}

/// Aggregate the first leg of `response`.
///
/// `requested` is the mode the user explicitly asked for, if any; defaulted
/// modes never count as a mismatch.
pub fn summarize(
    response: &RouteResponse,
    origin: &str,
    destination: &str,
    requested: Option<TravelMode>,
    locations: &Locations,
) -> Result<RouteSummary, AggregateError> {
    if response.status != "OK" {
        return Err(AggregateError::Status {
            status: response.status.clone(),
            message: response.error_message.clone().unwrap_or_default(),
        });
    }
    let leg = response.first_leg().ok_or(AggregateError::NoRoute)?;
    if leg.steps.is_empty() {
        return Err(AggregateError::NoRoute);
    }

    let segments = aggregate(&leg.steps);
    let dominant = dominant_mode(&segments);
    Ok(RouteSummary {
        addresses: full_addresses(origin, destination, leg, locations),
        duration: leg.duration.value,
        distance: leg.distance.value,
        dominant_mode: dominant,
        mode_mismatch: requested.is_some_and(|mode| mode.class() != dominant),
        departure_epoch: leg.departure_time.as_ref().map(|t| t.value),
        arrival_epoch: leg.arrival_time.as_ref().map(|t| t.value),
        segments,
    })
}
