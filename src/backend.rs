//! Routing and places backends
//!
//! Clients sit behind async traits so the runtime can be driven by mocks in
//! tests. `google` holds the production implementation.

pub mod google;

use crate::route::{RouteRequest, RouteResponse};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

pub use google::GoogleMaps;

/// Backend error with classification
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct BackendError {
    pub kind: BackendErrorKind,
    pub message: String,
}

impl BackendError {
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn request(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Request, message)
    }

    pub fn response(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Response, message)
    }
}

/// Which side of the exchange went wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BackendErrorKind {
    /// The request never got an answer (connect failure, timeout)
    Request,
    /// An answer came back but was unusable
    Response,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// A nearby point of interest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    #[serde(default)]
    pub vicinity: String,
    pub location: Coordinates,
}

#[async_trait]
pub trait RoutingClient: Send + Sync {
    async fn calculate_route(&self, request: &RouteRequest) -> Result<RouteResponse, BackendError>;
}

#[async_trait]
pub trait PlacesClient: Send + Sync {
    async fn nearby_search(&self, near: Coordinates, name: &str) -> Result<Vec<Place>, BackendError>;
}

#[async_trait]
impl<T: RoutingClient + ?Sized> RoutingClient for Arc<T> {
    async fn calculate_route(&self, request: &RouteRequest) -> Result<RouteResponse, BackendError> {
        (**self).calculate_route(request).await
    }
}

#[async_trait]
impl<T: PlacesClient + ?Sized> PlacesClient for Arc<T> {
    async fn nearby_search(&self, near: Coordinates, name: &str) -> Result<Vec<Place>, BackendError> {
        (**self).nearby_search(near, name).await
    }
}

/// Routing client wrapper that logs every call
pub struct LoggingRoutingClient<C> {
    inner: C,
}

impl<C> LoggingRoutingClient<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<C: RoutingClient> RoutingClient for LoggingRoutingClient<C> {
    async fn calculate_route(&self, request: &RouteRequest) -> Result<RouteResponse, BackendError> {
        let start = std::time::Instant::now();
        let result = self.inner.calculate_route(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::info!(
                    mode = request.travel_mode.api_mode(),
                    duration_ms = %duration.as_millis(),
                    status = %response.status,
                    routes = response.routes.len(),
                    "Route request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    mode = request.travel_mode.api_mode(),
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    kind = ?e.kind,
                    "Route request failed"
                );
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::TravelMode;

    struct Fixed(Result<RouteResponse, BackendError>);

    #[async_trait]
    impl RoutingClient for Fixed {
        async fn calculate_route(&self, _request: &RouteRequest) -> Result<RouteResponse, BackendError> {
            self.0.clone()
        }
    }

    fn request() -> RouteRequest {
        RouteRequest {
            origin: "Soho".to_string(),
            destination: "Mayfair".to_string(),
            travel_mode: TravelMode::Walking,
            departure_time: None,
            arrival_time: None,
        }
    }

    #[tokio::test]
    async fn logging_wrapper_passes_results_through() {
        let ok = LoggingRoutingClient::new(Fixed(Ok(RouteResponse {
            status: "OK".to_string(),
            ..RouteResponse::default()
        })));
        assert_eq!(ok.calculate_route(&request()).await.unwrap().status, "OK");

        let failing = LoggingRoutingClient::new(Arc::new(Fixed(Err(BackendError::request("refused")))));
        let error = failing.calculate_route(&request()).await.unwrap_err();
        assert_eq!(error.kind, BackendErrorKind::Request);
        assert_eq!(error.to_string(), "refused");
    }
}
