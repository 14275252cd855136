//! HTTP API for the trip assistant
//!
//! The voice transport posts recognized intents here and gets back what to
//! say and whether to keep the session open.

mod handlers;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::backend::PlacesClient;
use crate::runtime::ProductionRuntime;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<ProductionRuntime>,
    pub places: Arc<dyn PlacesClient>,
}

impl AppState {
    pub fn new(runtime: ProductionRuntime, places: Arc<dyn PlacesClient>) -> Self {
        Self {
            runtime: Arc::new(runtime),
            places,
        }
    }
}
