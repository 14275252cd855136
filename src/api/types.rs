//! API request and response types

use crate::backend::Place;
use crate::dialog::DialogState;
use serde::{Deserialize, Serialize};

/// Live dialog state, for debugging a session
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session_id: String,
    pub state: DialogState,
}

/// Query for a nearby place search
#[derive(Debug, Deserialize)]
pub struct PlacesQuery {
    pub lat: f64,
    pub lng: f64,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct PlacesResponse {
    pub places: Vec<Place>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub active_sessions: usize,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
