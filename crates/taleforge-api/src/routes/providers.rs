//! Operator view of the active policy and per-tier status.

use axum::extract::State;
use axum::{Json, Router, routing::get};
use serde::Serialize;
use taleforge_core::policy::Mode;
use taleforge_core::tier::Tier;
use taleforge_orchestrator::application::registry::TierStatus;

use crate::state::AppState;

/// Response body for GET /api/v1/providers.
#[derive(Debug, Serialize)]
pub struct ProvidersResponse {
    pub mode: Mode,
    pub chain: Vec<Tier>,
    pub allow_fallback: bool,
    pub default_tier: Tier,
    pub tiers: Vec<TierStatus>,
}

/// GET /api/v1/providers
async fn list_providers(State(state): State<AppState>) -> Json<ProvidersResponse> {
    let active = state.orchestrator.active();
    Json(ProvidersResponse {
        mode: active.policy.mode(),
        chain: active.policy.chain().to_vec(),
        allow_fallback: active.policy.allow_fallback(),
        default_tier: active.default_tier,
        tiers: state.orchestrator.registry().snapshot(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_providers))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use taleforge_core::config::OrchestratorSettings;
    use taleforge_core::event::{Clock, Telemetry};
    use taleforge_core::provider::ProviderTable;
    use taleforge_orchestrator::Orchestrator;
    use taleforge_test_support::{
        FailingFactory, FixedClock, RecordingSink, ScriptedFactory, ScriptedProvider,
    };
    use tower::ServiceExt;

    use super::*;

    #[tokio::test]
    async fn test_list_providers_reports_policy_and_tiers() {
        // Arrange
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::default());
        let table = ProviderTable::new()
            .with(Tier::Remote, Arc::new(FailingFactory::missing_credentials()))
            .with(
                Tier::Local,
                Arc::new(ScriptedFactory::new(Arc::new(ScriptedProvider::healthy(Tier::Local)))),
            );
        let orchestrator = Orchestrator::start(
            OrchestratorSettings::default(),
            table,
            Telemetry::new(clock, Arc::new(RecordingSink::new())),
        )
        .await
        .unwrap();
        let app = router().with_state(AppState::new(Arc::new(orchestrator)));
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();

        // Act
        let response = app.oneshot(request).await.unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::OK);
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body_bytes).unwrap();

        assert_eq!(json["mode"], "remote_first");
        assert_eq!(json["chain"], serde_json::json!(["remote", "local", "edge"]));
        assert_eq!(json["allow_fallback"], true);
        assert_eq!(json["default_tier"], "local");

        let tiers = json["tiers"].as_array().unwrap();
        assert_eq!(tiers.len(), 3);
        assert_eq!(tiers[0]["tier"], "remote");
        assert_eq!(tiers[0]["instance"], "failed");
        assert_eq!(tiers[0]["health"]["text"], "failed");
        assert_eq!(tiers[1]["instance"], "ready");
        assert_eq!(tiers[1]["construction_attempts"], 1);
        assert_eq!(tiers[2]["instance"], "untried");
        assert_eq!(tiers[2]["construction_attempts"], 0);
    }
}
