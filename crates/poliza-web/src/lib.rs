//! HTTP service for insurance policy field extraction.

pub mod api;
pub mod state;

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use state::AppState;

/// The full application with middleware.
pub fn app(state: AppState) -> Router {
    api::router()
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
