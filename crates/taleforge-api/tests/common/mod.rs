//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use taleforge_core::config::OrchestratorSettings;
use taleforge_core::event::{Clock, Telemetry};
use taleforge_core::provider::{Provider, ProviderTable};
use taleforge_core::tier::Tier;
use taleforge_orchestrator::Orchestrator;
use taleforge_test_support::{FixedClock, RecordingSink, ScriptedFactory, ScriptedProvider};
use tower::ServiceExt;

use taleforge_api::state::AppState;

/// Everything a test needs to drive the app and inspect what happened.
pub struct TestApp {
    pub orchestrator: Arc<Orchestrator>,
    pub sink: Arc<RecordingSink>,
}

impl TestApp {
    /// Router over the shared orchestrator, built the same way as `main.rs`.
    pub fn router(&self) -> Router {
        taleforge_api::app(AppState::new(self.orchestrator.clone()))
    }
}

/// A table with one scripted provider per given tier.
pub fn table(providers: &[&Arc<ScriptedProvider>]) -> ProviderTable {
    providers.iter().fold(ProviderTable::new(), |table, provider| {
        let provider: Arc<ScriptedProvider> = (*provider).clone();
        table.with(provider.tier(), Arc::new(ScriptedFactory::new(provider)))
    })
}

/// Bootstrap an orchestrator under `mode` over `table` with a fixed clock.
pub async fn build_test_app(mode: &str, table: ProviderTable) -> TestApp {
    let sink = Arc::new(RecordingSink::new());
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::default());
    let settings = OrchestratorSettings {
        mode: mode.to_owned(),
        ..OrchestratorSettings::default()
    };
    let orchestrator = Orchestrator::start(settings, table, Telemetry::new(clock, sink.clone()))
        .await
        .unwrap();
    TestApp {
        orchestrator: Arc::new(orchestrator),
        sink,
    }
}

/// A healthy scripted provider for `tier`.
pub fn healthy(tier: Tier) -> Arc<ScriptedProvider> {
    Arc::new(ScriptedProvider::healthy(tier))
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}
