//! Taleforge: HTTP surface over the generation orchestrator.

use axum::Router;

pub mod error;
pub mod routes;
pub mod state;

use state::AppState;

/// Builds the full router: health probe plus the versioned API.
#[must_use]
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/stories", routes::stories::router())
        .nest("/api/v1/providers", routes::providers::router())
        .with_state(state)
}
