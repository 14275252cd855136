//! HTTP request handlers

use super::types::{ErrorResponse, HealthResponse, PlacesQuery, PlacesResponse, SessionResponse};
use super::AppState;
use crate::backend::Coordinates;
use crate::runtime::{RuntimeError, TurnReply};
use crate::slot::IntentMessage;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Dialog turns
        .route("/api/intents", post(handle_intent))
        .route("/api/sessions/:id/not-recognized", post(not_recognized))
        .route("/api/sessions/:id", get(get_session).delete(end_session))
        // Places lookup
        .route("/api/places", get(search_places))
        .route("/api/health", get(health))
        .with_state(state)
}

// ============================================================
// Dialog turns
// ============================================================

async fn handle_intent(
    State(state): State<AppState>,
    Json(message): Json<IntentMessage>,
) -> Result<Json<TurnReply>, AppError> {
    let reply = state.runtime.handle_intent(message).await?;
    Ok(Json(reply))
}

async fn not_recognized(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TurnReply>, AppError> {
    let reply = state.runtime.handle_not_recognized(&id).await?;
    Ok(Json(reply))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, AppError> {
    let dialog_state = state
        .runtime
        .session_state(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("no dialog in progress for session {id}")))?;
    Ok(Json(SessionResponse {
        session_id: id,
        state: dialog_state,
    }))
}

/// Transport-side hangup; the dialog is dropped without a reply
async fn end_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.runtime.end_session(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================
// Places
// ============================================================

async fn search_places(
    State(state): State<AppState>,
    Query(query): Query<PlacesQuery>,
) -> Result<Json<PlacesResponse>, AppError> {
    let near = Coordinates {
        lat: query.lat,
        lng: query.lng,
    };
    let places = state
        .places
        .nearby_search(near, &query.name)
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;
    Ok(Json(PlacesResponse { places }))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        active_sessions: state.runtime.active_sessions().await,
    })
}

// ============================================================
// Error handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Upstream(String),
}

impl From<RuntimeError> for AppError {
    fn from(error: RuntimeError) -> Self {
        match error {
            RuntimeError::SessionNotFound(_) => AppError::NotFound(error.to_string()),
            RuntimeError::UnknownIntent(_) | RuntimeError::Transition(_) => {
                AppError::BadRequest(error.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{GoogleMaps, LoggingRoutingClient, Place};
    use crate::config::{AssistantConfig, Locations, SavedPlace};
    use crate::runtime::{DialogRuntime, LogSpeechSink};
    use crate::speech::EnglishComposer;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    struct OnePlace;

    #[async_trait]
    impl crate::backend::PlacesClient for OnePlace {
        async fn nearby_search(
            &self,
            near: Coordinates,
            name: &str,
        ) -> Result<Vec<Place>, crate::backend::BackendError> {
            Ok(vec![Place {
                name: name.to_string(),
                vicinity: "Old Brompton Rd".to_string(),
                location: near,
            }])
        }
    }

    fn app() -> Router {
        let config = AssistantConfig {
            locations: Locations {
                current: "home".to_string(),
                home: SavedPlace::new("21 Onslow Gardens", "London"),
                work: SavedPlace::default(),
            },
            ..AssistantConfig::default()
        };
        // Nothing listens on the discard port, so routes fail fast
        let maps = Arc::new(GoogleMaps::new(&config).unwrap().with_base_url("http://127.0.0.1:9"));
        let runtime = DialogRuntime::new(
            &config,
            LoggingRoutingClient::new(maps),
            EnglishComposer::new(config.unit_system),
            Arc::new(LogSpeechSink) as Arc<dyn crate::runtime::SpeechSink>,
        );
        create_router(AppState::new(runtime, Arc::new(OnePlace)))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_json(uri: &str, body: &Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn intent_turn_returns_reply() {
        let body = json!({
            "sessionId": "abc",
            "intent": { "intentName": "trip-assistant:GetDepartureTime", "confidenceScore": 0.9 },
            "slots": [{
                "slotName": "location_to",
                "confidenceScore": 0.9,
                "value": { "kind": "Custom", "value": "Soho" }
            }]
        });

        let app = app();
        let (status, reply) = send(app.clone(), post_json("/api/intents", &body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(reply["sessionId"], "abc");
        assert_eq!(reply["text"], "At what time do you want to arrive?");
        assert_eq!(reply["action"]["type"], "continue");
        assert_eq!(reply["action"]["intent_filter"][0], "ElicitArrivalTime");

        let (status, session) = send(app, Request::get("/api/sessions/abc").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(session["state"]["type"], "awaiting_arrival_time");
    }

    #[tokio::test]
    async fn unknown_intent_is_bad_request() {
        let body = json!({
            "sessionId": "abc",
            "intent": { "intentName": "GetWeather", "confidenceScore": 0.9 }
        });
        let (status, error) = send(app(), post_json("/api/intents", &body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(error["error"].as_str().unwrap().contains("GetWeather"));
    }

    #[tokio::test]
    async fn missing_session_is_not_found() {
        let request = Request::post("/api/sessions/nope/not-recognized")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(app(), request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_drops_an_abandoned_session() {
        let body = json!({
            "sessionId": "abc",
            "intent": { "intentName": "GetDepartureTime", "confidenceScore": 0.9 },
            "slots": [{
                "slotName": "location_to",
                "confidenceScore": 0.9,
                "value": { "kind": "Custom", "value": "Soho" }
            }]
        });

        let app = app();
        let (status, _) = send(app.clone(), post_json("/api/intents", &body)).await;
        assert_eq!(status, StatusCode::OK);

        let response = app
            .clone()
            .oneshot(Request::delete("/api/sessions/abc").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let (status, health) = send(app.clone(), Request::get("/api/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(health["activeSessions"], 0);

        let (status, _) = send(app, Request::delete("/api/sessions/abc").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn places_search_passes_through() {
        let request = Request::get("/api/places?lat=51.49&lng=-0.17&name=Tesco")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app(), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["places"][0]["name"], "Tesco");
        assert_eq!(body["places"][0]["vicinity"], "Old Brompton Rd");
    }

    #[tokio::test]
    async fn health_reports_sessions() {
        let (status, body) = send(app(), Request::get("/api/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok", "activeSessions": 0 }));
    }
}
