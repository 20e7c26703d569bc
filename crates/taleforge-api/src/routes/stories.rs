//! Story generation endpoint.

use axum::extract::State;
use axum::{Json, Router, routing::post};
use taleforge_core::request::{GenerationRequest, GenerationResult};
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/v1/stories
#[instrument(
    skip(state, request),
    fields(theme = %request.theme, num_scenes = request.num_scenes)
)]
async fn create_story(
    State(state): State<AppState>,
    Json(request): Json<GenerationRequest>,
) -> Result<Json<GenerationResult>, ApiError> {
    let result = state.orchestrator.generate(&request).await?;

    info!(
        request_id = %result.metadata.request_id,
        frames = result.frames.len(),
        narrated = !result.audio_url.is_empty(),
        "story generated"
    );

    Ok(Json(result))
}

/// Returns the router for story generation.
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(create_story))
}
