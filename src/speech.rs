//! Turning dialog utterances into spoken English

use crate::config::UnitSystem;
use crate::dialog::{FailureReason, Flow, Prompt, TripReport, Utterance};
use crate::route::aggregate::VehicleKind;
use crate::route::{ModeClass, Segment, SegmentMode, TravelMode};
use chrono::{DateTime, FixedOffset, Timelike};

const FEET_PER_METRE: f64 = 3.280_84;
const FEET_PER_MILE: f64 = 5280.0;

/// Puts an utterance into words
pub trait SpeechComposer: Send + Sync {
    fn compose(&self, utterance: &Utterance) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishComposer {
    units: UnitSystem,
}

impl EnglishComposer {
    pub fn new(units: UnitSystem) -> Self {
        Self { units }
    }

    fn prompt(prompt: Prompt) -> &'static str {
        match prompt {
            Prompt::NoOriginAddress => "Sorry, I didn't catch where you are leaving from. Where does the trip start?",
            Prompt::NoArrivalTime => "At what time do you want to arrive?",
            Prompt::NoDepartureTime => "At what time do you want to leave?",
        }
    }

    fn failure(reason: FailureReason) -> &'static str {
        match reason {
            FailureReason::IntentNotRecognized => "Sorry, I didn't understand where you want to go.",
            FailureReason::SlotsNotRecognized => "Sorry, I still didn't understand. Please start again.",
            FailureReason::NoArrivalTime => "Sorry, I need to know when you want to arrive.",
            FailureReason::NoDepartureTime => "Sorry, I need to know when you want to leave.",
            FailureReason::ApiRequest => {
                "I couldn't reach the directions service. Please check the network connection."
            }
            FailureReason::ApiResponse => "The directions service gave me an answer I couldn't use.",
            FailureReason::NoCurrentAddress => "Please set the current location of this device first.",
            FailureReason::BadCurrentAddress => "The current location of this device must be home or work.",
            FailureReason::NoHomeAddress => "Please set your home address first.",
            FailureReason::NoWorkAddress => "Please set your work address first.",
        }
    }

    fn trip(&self, report: &TripReport) -> String {
        let summary = &report.summary;
        let from = &summary.addresses.origin;
        let to = &summary.addresses.destination;
        let duration = duration(summary.duration);
        let distance = self.distance(summary.distance);

        let mut sentences = Vec::new();
        if let Some(requested) = report.requested_mode.filter(|_| summary.mode_mismatch) {
            sentences.push(format!(
                "I couldn't find a trip {}, but here is one {}.",
                by_mode(requested),
                by_class(summary.dominant_mode)
            ));
        }

        match (report.flow, report.departure_time, report.arrival_time) {
            (Flow::Directions, _, _) => {
                let legs: Vec<_> = summary.segments.iter().map(|s| self.segment(s)).collect();
                sentences.push(format!("To get from {from} to {to}, {}.", legs.join(", then ")));
                sentences.push(format!("The whole trip takes {duration} and covers {distance}."));
            }
            (Flow::DepartureTime, Some(departure), Some(arrival)) => {
                sentences.push(format!(
                    "To arrive at {to} at {}, leave {from} at {}. The trip takes {duration}.",
                    clock(&arrival),
                    clock(&departure)
                ));
            }
            (Flow::ArrivalTime, Some(departure), Some(arrival)) => {
                sentences.push(format!(
                    "If you leave {from} at {}, you will arrive at {to} at {}. The trip takes {duration}.",
                    clock(&departure),
                    clock(&arrival)
                ));
            }
            _ => {
                sentences.push(format!(
                    "It takes {duration} to get from {from} to {to} {}, {distance} in total.",
                    by_mode(report.travel_mode)
                ));
            }
        }
        sentences.join(" ")
    }

    fn segment(&self, segment: &Segment) -> String {
        let took = duration(segment.duration);
        match segment.mode {
            SegmentMode::Walking => format!("walk for {took}"),
            SegmentMode::Driving => format!("drive {} ({took})", self.distance(segment.distance)),
            SegmentMode::Bicycling => format!("cycle {} ({took})", self.distance(segment.distance)),
            SegmentMode::Transit(vehicle) => match &segment.line {
                Some(line) => {
                    let mut phrase = format!("take the {} {}", line.name, vehicle_name(vehicle));
                    if let Some(headsign) = &line.headsign {
                        phrase.push_str(" towards ");
                        phrase.push_str(&expand_headsign(headsign));
                    }
                    match line.num_stops {
                        Some(1) => phrase.push_str(" for 1 stop"),
                        Some(stops) => phrase.push_str(&format!(" for {stops} stops")),
                        None => {}
                    }
                    if let Some(stop) = &line.arrival_stop {
                        phrase.push_str(" and get off at ");
                        phrase.push_str(stop);
                    }
                    phrase
                }
                None => format!("take the {} for {took}", vehicle_name(vehicle)),
            },
        }
    }

    /// Distance in the configured unit system
    pub fn distance(&self, metres: u64) -> String {
        #[allow(clippy::cast_precision_loss)]
        let metres_f = metres as f64;
        match self.units {
            UnitSystem::Metric if metres < 1000 => counted(floor_to(metres, 10).to_string(), "meter"),
            UnitSystem::Metric => {
                let km = metres_f / 1000.0;
                let text = if km < 20.0 { one_decimal(km) } else { format!("{km:.0}") };
                counted(text, "kilometer")
            }
            UnitSystem::Imperial => {
                let feet = metres_f * FEET_PER_METRE;
                if feet > FEET_PER_MILE {
                    counted(one_decimal(feet / FEET_PER_MILE), "mile")
                } else {
                    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                    let whole_feet = feet as u64;
                    format!("{} feet", floor_to(whole_feet, 100))
                }
            }
        }
    }
}

impl SpeechComposer for EnglishComposer {
    fn compose(&self, utterance: &Utterance) -> String {
        match utterance {
            Utterance::Prompt { prompt } => Self::prompt(*prompt).to_string(),
            Utterance::SameLocations => {
                "You are already there! The start and the destination are the same place.".to_string()
            }
            Utterance::Trip { report } => self.trip(report),
            Utterance::Failure { reason } => Self::failure(*reason).to_string(),
        }
    }
}

/// Round down to a multiple of `step`, never below one step
fn floor_to(value: u64, step: u64) -> u64 {
    (value / step * step).max(step)
}

fn one_decimal(value: f64) -> String {
    let text = format!("{value:.1}");
    match text.strip_suffix(".0") {
        Some(whole) => whole.to_string(),
        None => text,
    }
}

fn counted(amount: String, unit: &str) -> String {
    if amount == "1" {
        format!("1 {unit}")
    } else {
        format!("{amount} {unit}s")
    }
}

/// "12 minutes", "1 hour and 5 minutes"
pub fn duration(seconds: u64) -> String {
    let total_minutes = ((seconds + 30) / 60).max(u64::from(seconds > 0));
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    let hours_text = counted(hours.to_string(), "hour");
    let minutes_text = counted(minutes.to_string(), "minute");
    match (hours, minutes) {
        (0, _) => minutes_text,
        (_, 0) => hours_text,
        _ => format!("{hours_text} and {minutes_text}"),
    }
}

/// 12-hour clock, dropping `:00`
pub fn clock(time: &DateTime<FixedOffset>) -> String {
    if time.minute() == 0 {
        time.format("%-I %p").to_string()
    } else {
        time.format("%-I:%M %p").to_string()
    }
}

/// Spell out street abbreviations in a transit headsign
///
/// An abbreviation only counts after a space and before `/`, `-`, `,`, a
/// space or the end, so a leading "St Pancras" keeps its saint.
pub fn expand_headsign(headsign: &str) -> String {
    const DELIMITERS: [char; 4] = [' ', '/', '-', ','];

    let mut expanded = String::with_capacity(headsign.len() + 16);
    let mut after_space = false;
    for piece in headsign.split_inclusive(DELIMITERS) {
        let (word, delimiter) = match piece.char_indices().last() {
            Some((at, c)) if DELIMITERS.contains(&c) => piece.split_at(at),
            _ => (piece, ""),
        };
        let long = match word {
            "Av" | "AV" | "Av." | "Ave" if after_space => "Avenue",
            "Rd" if after_space => "Road",
            "St" | "ST" if after_space => "Street",
            "Pk" if after_space => "Park",
            "Blvd" if after_space => "Boulevard",
            _ => word,
        };
        expanded.push_str(long);
        expanded.push_str(delimiter);
        after_space = delimiter == " ";
    }
    expanded.replace('/', " ")
}

fn vehicle_name(vehicle: VehicleKind) -> &'static str {
    match vehicle {
        VehicleKind::Subway => "metro",
        VehicleKind::Bus => "bus",
        VehicleKind::Train => "train",
        VehicleKind::Tram => "tram",
        VehicleKind::Ferry => "ferry",
        VehicleKind::Other => "line",
    }
}

fn by_mode(mode: TravelMode) -> &'static str {
    match mode {
        TravelMode::Driving => "by car",
        TravelMode::Walking => "on foot",
        TravelMode::Bicycling => "by bike",
        TravelMode::Transit => "by public transport",
        TravelMode::Bus => "by bus",
        TravelMode::Train => "by train",
        TravelMode::Subway => "by metro",
        TravelMode::Tram => "by tram",
    }
}

fn by_class(class: ModeClass) -> &'static str {
    match class {
        ModeClass::Walking => "on foot",
        ModeClass::Driving => "by car",
        ModeClass::Bicycling => "by bike",
        ModeClass::Transit => "by public transport",
    }
}
