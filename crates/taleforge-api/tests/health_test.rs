//! Integration tests for the health endpoint.

mod common;

use axum::http::StatusCode;
use taleforge_core::tier::Tier;

#[tokio::test]
async fn test_health_returns_200_with_status_ok() {
    let local = common::healthy(Tier::Local);
    let app = common::build_test_app("local_only", common::table(&[&local])).await;

    let (status, json) = common::get_json(app.router(), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["mode"], "local_only");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let local = common::healthy(Tier::Local);
    let app = common::build_test_app("local_only", common::table(&[&local])).await;

    let request = axum::http::Request::builder()
        .method("GET")
        .uri("/api/v1/nonexistent")
        .body(axum::body::Body::empty())
        .unwrap();

    let response = tower::ServiceExt::oneshot(app.router(), request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
