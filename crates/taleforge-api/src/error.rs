//! Taleforge API: error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use taleforge_core::error::GenerationError;
use thiserror::Error;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A server setting is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The orchestrator refused to start.
    #[error("startup failed: {0}")]
    Startup(#[from] GenerationError),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer wrapper around `GenerationError` that implements `IntoResponse`.
#[derive(Debug)]
pub struct ApiError(pub GenerationError);

impl From<GenerationError> for ApiError {
    fn from(err: GenerationError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self.0 {
            GenerationError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            GenerationError::ChainExhausted { .. } => (StatusCode::BAD_GATEWAY, "chain_exhausted"),
            GenerationError::DeadlineExceeded(_) => {
                (StatusCode::GATEWAY_TIMEOUT, "deadline_exceeded")
            }
            GenerationError::Configuration(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "configuration_error")
            }
            GenerationError::ProviderInitialization { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "provider_initialization_error")
            }
            GenerationError::ProviderGeneration { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "provider_generation_error")
            }
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, code = error_code, "request failed");
        }

        let body = ErrorBody {
            error: error_code,
            message: self.0.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
