//! Assistant configuration
//!
//! Everything is read from the environment once at startup.

use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_SLOT_CONFIDENCE_THRESHOLD: f64 = 0.5;
pub const DEFAULT_INTENT_FILTER_PROBABILITY_THRESHOLD: f64 = 0.5;
pub const DEFAULT_RETRY_BUDGET: u32 = 2;
pub const DEFAULT_LATENCY_BOUND: Duration = Duration::from_millis(4000);

/// Problems with the saved locations, reported to the user on first use
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("no current location configured")]
    NoCurrentAddress,
    #[error("current location must be `home` or `work`, got `{0}`")]
    BadCurrentAddress(String),
    #[error("home address is not configured")]
    NoHomeAddress,
    #[error("work address is not configured")]
    NoWorkAddress,
}

/// Short names the user can say instead of a full address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alias {
    Home,
    Work,
}

impl Alias {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "home" => Some(Alias::Home),
            "work" => Some(Alias::Work),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Alias::Home => "home",
            Alias::Work => "work",
        }
    }
}

/// A configured address
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SavedPlace {
    pub address: String,
    pub city: String,
}

impl SavedPlace {
    pub fn new(address: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            city: city.into(),
        }
    }

    pub fn is_set(&self) -> bool {
        !self.address.trim().is_empty()
    }

    /// Address as sent to the routing backend
    pub fn query(&self) -> String {
        if self.city.trim().is_empty() {
            self.address.clone()
        } else {
            format!("{}, {}", self.address, self.city)
        }
    }
}

/// Saved locations and the one the device currently sits at
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Locations {
    /// `home` or `work`
    pub current: String,
    pub home: SavedPlace,
    pub work: SavedPlace,
}

impl Locations {
    pub fn place(&self, alias: Alias) -> Result<&SavedPlace, ConfigError> {
        match alias {
            Alias::Home if self.home.is_set() => Ok(&self.home),
            Alias::Home => Err(ConfigError::NoHomeAddress),
            Alias::Work if self.work.is_set() => Ok(&self.work),
            Alias::Work => Err(ConfigError::NoWorkAddress),
        }
    }

    /// Where trips start when the user does not say
    pub fn current(&self) -> Result<(Alias, &SavedPlace), ConfigError> {
        if self.current.trim().is_empty() {
            return Err(ConfigError::NoCurrentAddress);
        }
        let alias = Alias::parse(&self.current)
            .ok_or_else(|| ConfigError::BadCurrentAddress(self.current.clone()))?;
        Ok((alias, self.place(alias)?))
    }

    /// Alias whose configured address matches `address` (either contains the other)
    pub fn alias_for(&self, address: &str) -> Option<Alias> {
        let address = address.trim().to_lowercase();
        if address.is_empty() {
            return None;
        }
        [Alias::Home, Alias::Work].into_iter().find(|alias| {
            let place = match alias {
                Alias::Home => &self.home,
                Alias::Work => &self.work,
            };
            if !place.is_set() {
                return false;
            }
            let saved = place.address.to_lowercase();
            address.contains(&saved) || saved.contains(&address)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("imperial") {
            UnitSystem::Imperial
        } else {
            UnitSystem::Metric
        }
    }

    pub fn api_name(self) -> &'static str {
        match self {
            UnitSystem::Metric => "metric",
            UnitSystem::Imperial => "imperial",
        }
    }
}

/// Thresholds driving the dialog
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DialogSettings {
    pub slot_confidence_threshold: f64,
    pub intent_filter_probability_threshold: f64,
    /// Clarification turns allowed before giving up
    pub retry_budget: u32,
}

impl Default for DialogSettings {
    fn default() -> Self {
        Self {
            slot_confidence_threshold: DEFAULT_SLOT_CONFIDENCE_THRESHOLD,
            intent_filter_probability_threshold: DEFAULT_INTENT_FILTER_PROBABILITY_THRESHOLD,
            retry_budget: DEFAULT_RETRY_BUDGET,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AssistantConfig {
    pub api_key: Option<String>,
    pub locations: Locations,
    pub unit_system: UnitSystem,
    /// Region bias for geocoding (e.g. `uk`)
    pub region: Option<String>,
    pub language: String,
    pub dialog: DialogSettings,
    /// Past this, replies go through the speech sink instead of the turn reply
    pub latency_bound: Duration,
    pub tts_url: Option<String>,
    pub port: u16,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            locations: Locations::default(),
            unit_system: UnitSystem::Metric,
            region: None,
            language: "en".to_string(),
            dialog: DialogSettings::default(),
            latency_bound: DEFAULT_LATENCY_BOUND,
            tts_url: None,
            port: 8000,
        }
    }
}

impl AssistantConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            api_key: get("DIRECTIONS_API_KEY").filter(|k| !k.is_empty()),
            locations: Locations {
                current: get("CURRENT_LOCATION").unwrap_or_default(),
                home: SavedPlace::new(
                    get("HOME_ADDRESS").unwrap_or_default(),
                    get("HOME_CITY").unwrap_or_default(),
                ),
                work: SavedPlace::new(
                    get("WORK_ADDRESS").unwrap_or_default(),
                    get("WORK_CITY").unwrap_or_default(),
                ),
            },
            unit_system: get("UNIT_SYSTEM").map(|u| UnitSystem::parse(&u)).unwrap_or_default(),
            region: get("CURRENT_REGION").filter(|r| !r.is_empty()),
            language: get("LANGUAGE").unwrap_or(defaults.language),
            dialog: DialogSettings {
                slot_confidence_threshold: parse_var(get("SLOT_CONFIDENCE_THRESHOLD"))
                    .unwrap_or(DEFAULT_SLOT_CONFIDENCE_THRESHOLD),
                intent_filter_probability_threshold: parse_var(get("INTENT_FILTER_PROBABILITY_THRESHOLD"))
                    .unwrap_or(DEFAULT_INTENT_FILTER_PROBABILITY_THRESHOLD),
                retry_budget: parse_var(get("RETRY_BUDGET")).unwrap_or(DEFAULT_RETRY_BUDGET),
            },
            latency_bound: parse_var(get("LATENCY_BOUND_MS"))
                .map_or(DEFAULT_LATENCY_BOUND, Duration::from_millis),
            tts_url: get("TTS_URL").filter(|u| !u.is_empty()),
            port: parse_var(get("ASSISTANT_PORT")).unwrap_or(defaults.port),
        }
    }
}

fn parse_var<T: FromStr>(raw: Option<String>) -> Option<T> {
    raw.and_then(|v| v.trim().parse().ok())
}
