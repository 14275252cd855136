//! Google Maps Directions and Places clients

use super::{BackendError, Coordinates, Place, PlacesClient, RoutingClient};
use crate::config::{AssistantConfig, UnitSystem};
use crate::route::{RouteRequest, RouteResponse};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const DIRECTIONS_URL: &str = "https://maps.googleapis.com/maps/api/directions/json";
const PLACES_URL: &str = "https://maps.googleapis.com/maps/api/place/nearbysearch/json";

/// Search radius for nearby places, in metres
const PLACES_RADIUS: u32 = 50_000;

pub struct GoogleMaps {
    client: Client,
    api_key: String,
    directions_url: String,
    places_url: String,
    language: String,
    region: Option<String>,
    units: UnitSystem,
}

impl GoogleMaps {
    pub fn new(config: &AssistantConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| BackendError::request(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone().unwrap_or_default(),
            directions_url: DIRECTIONS_URL.to_string(),
            places_url: PLACES_URL.to_string(),
            language: config.language.clone(),
            region: config.region.clone(),
            units: config.unit_system,
        })
    }

    /// Point both endpoints somewhere else
    #[allow(dead_code)] // Used against local stand-ins
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        self.directions_url = format!("{base}/directions/json");
        self.places_url = format!("{base}/place/nearbysearch/json");
        self
    }

    fn directions_query(&self, request: &RouteRequest) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("origin", request.origin.clone()),
            ("destination", request.destination.clone()),
            ("mode", request.travel_mode.api_mode().to_string()),
            ("language", self.language.clone()),
            ("units", self.units.api_name().to_string()),
            ("key", self.api_key.clone()),
        ];
        if let Some(transit_mode) = request.travel_mode.api_transit_mode() {
            query.push(("transit_mode", transit_mode.to_string()));
        }
        if let Some(region) = &self.region {
            query.push(("region", region.clone()));
        }
        if let Some(departure) = request.departure_time {
            query.push(("departure_time", departure.timestamp().to_string()));
        }
        // Only transit honours a target arrival
        if let Some(arrival) = request.arrival_time.filter(|_| request.travel_mode.is_transit()) {
            query.push(("arrival_time", arrival.timestamp().to_string()));
        }
        query
    }

    fn places_query(&self, near: Coordinates, name: &str) -> Vec<(&'static str, String)> {
        vec![
            ("location", format!("{},{}", near.lat, near.lng)),
            ("radius", PLACES_RADIUS.to_string()),
            ("name", name.to_string()),
            ("language", self.language.clone()),
            ("key", self.api_key.clone()),
        ]
    }

    async fn get(&self, url: &str, query: &[(&'static str, String)]) -> Result<String, BackendError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BackendError::response(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(BackendError::response(format!("HTTP {status}: {body}")));
        }
        Ok(body)
    }
}

fn classify_send_error(e: reqwest::Error) -> BackendError {
    if e.is_timeout() {
        BackendError::request(format!("Request timeout: {e}"))
    } else if e.is_connect() {
        BackendError::request(format!("Connection failed: {e}"))
    } else {
        BackendError::request(format!("Request failed: {e}"))
    }
}

fn parse_directions(body: &str) -> Result<RouteResponse, BackendError> {
    let response: RouteResponse = serde_json::from_str(body)
        .map_err(|e| BackendError::response(format!("Failed to parse directions: {e}")))?;
    if response.status != "OK" {
        return Err(BackendError::response(format!(
            "Directions status {}: {}",
            response.status,
            response.error_message.as_deref().unwrap_or("no details")
        )));
    }
    Ok(response)
}

#[derive(Debug, Deserialize)]
struct PlacesResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<PlaceResult>,
}

#[derive(Debug, Deserialize)]
struct PlaceResult {
    name: String,
    #[serde(default)]
    vicinity: String,
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: Coordinates,
}

fn parse_places(body: &str) -> Result<Vec<Place>, BackendError> {
    let response: PlacesResponse = serde_json::from_str(body)
        .map_err(|e| BackendError::response(format!("Failed to parse places: {e}")))?;
    match response.status.as_str() {
        "OK" | "ZERO_RESULTS" => Ok(response
            .results
            .into_iter()
            .map(|r| Place {
                name: r.name,
                vicinity: r.vicinity,
                location: r.geometry.location,
            })
            .collect()),
        status => Err(BackendError::response(format!(
            "Places status {status}: {}",
            response.error_message.as_deref().unwrap_or("no details")
        ))),
    }
}

#[async_trait]
impl RoutingClient for GoogleMaps {
    async fn calculate_route(&self, request: &RouteRequest) -> Result<RouteResponse, BackendError> {
        let body = self.get(&self.directions_url, &self.directions_query(request)).await?;
        parse_directions(&body)
    }
}

#[async_trait]
impl PlacesClient for GoogleMaps {
    async fn nearby_search(&self, near: Coordinates, name: &str) -> Result<Vec<Place>, BackendError> {
        let body = self.get(&self.places_url, &self.places_query(near, name)).await?;
        parse_places(&body)
    }
}
