//! Shared application state.

use std::sync::Arc;

use taleforge_orchestrator::Orchestrator;

/// Application state shared across all request handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The bootstrapped orchestrator serving every request.
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self { orchestrator }
    }
}
