//! Trip assistant - voice assistant skill for public transport directions
//!
//! Receives recognized intents from a voice transport, runs them through a
//! dialog state machine that asks for missing details, and answers with
//! spoken directions, trip durations and departure/arrival times.

mod api;
mod backend;
mod config;
mod dialog;
mod route;
mod runtime;
mod slot;
mod speech;

use api::{create_router, AppState};
use backend::{GoogleMaps, LoggingRoutingClient};
use config::AssistantConfig;
use runtime::{DialogRuntime, HttpSpeechSink, LogSpeechSink, SpeechSink};
use speech::EnglishComposer;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trip_assistant=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = AssistantConfig::from_env();

    if config.api_key.is_none() {
        tracing::warn!("No directions API key configured. Set DIRECTIONS_API_KEY.");
    }
    if let Err(e) = config.locations.current() {
        // Reported to the user on every request until fixed
        tracing::warn!(error = %e, "Saved locations are incomplete");
    }

    let maps = Arc::new(GoogleMaps::new(&config)?);

    let sink: Arc<dyn SpeechSink> = match &config.tts_url {
        Some(url) => {
            tracing::info!(url = %url, "Late replies go to the speech endpoint");
            Arc::new(HttpSpeechSink::new(url.clone())?)
        }
        None => Arc::new(LogSpeechSink),
    };

    let runtime = DialogRuntime::new(
        &config,
        LoggingRoutingClient::new(Arc::clone(&maps)),
        EnglishComposer::new(config.unit_system),
        sink,
    );

    tracing::info!(
        retry_budget = config.dialog.retry_budget,
        latency_bound_ms = %config.latency_bound.as_millis(),
        units = config.unit_system.api_name(),
        "Dialog runtime initialized"
    );

    // Create application state
    let state = AppState::new(runtime, maps);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state).layer(cors).layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Trip assistant listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
