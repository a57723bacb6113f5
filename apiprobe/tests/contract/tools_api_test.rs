//! /api/tests, /api/health-checks, /api/health-status の契約テスト

use apiprobe::api::create_app;
use apiprobe::AppState;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::support::probe::{test_config, test_state};

async fn call(state: &AppState, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    let body = body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty);
    let response = create_app(state.clone())
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_run_test_returns_result_for_pass_and_fail() {
    let target = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&target)
        .await;
    let state = test_state();

    let (status, body) = call(
        &state,
        "POST",
        "/api/tests",
        Some(json!({"url": format!("{}/ok", target.uri()), "expectations": {"statusCode": 200}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["testStatus"], "PASS");
    assert_eq!(body["cached"], false);

    let (status, body) = call(
        &state,
        "POST",
        "/api/tests",
        Some(json!({"url": format!("{}/ok", target.uri()), "expectations": {"statusCode": 404}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["testStatus"], "FAIL");
    assert_eq!(body["failedChecks"], 1);
}

#[tokio::test]
async fn test_run_test_without_url_is_bad_request() {
    let (status, body) = call(&test_state(), "POST", "/api/tests", Some(json!({"method": "GET"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn test_health_check_uses_configured_target() {
    let target = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&target)
        .await;
    let url = format!("{}/health", target.uri());
    let state = AppState::new(apiprobe::config::ProbeConfig {
        health_check_url: Some(url.clone()),
        ..test_config()
    })
    .unwrap();

    let (status, body) = call(&state, "POST", "/api/health-checks", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["url"], json!(url));
    assert_eq!(body["status"], "UP");
    assert_eq!(body["statusCode"], 204);

    let (status, snapshot) = call(&state, "GET", "/api/health-status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot[&url]["status"], "UP");
}

#[tokio::test]
async fn test_health_check_without_any_target_is_bad_request() {
    let (status, body) = call(&test_state(), "POST", "/api/health-checks", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status_code"], 400);
}

#[tokio::test]
async fn test_health_status_is_empty_before_any_check() {
    let (status, body) = call(&test_state(), "GET", "/api/health-status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));
}
