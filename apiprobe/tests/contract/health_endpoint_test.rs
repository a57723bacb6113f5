//! GET /health の契約テスト

use apiprobe::api::create_app;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use serde_json::Value;
use tower::ServiceExt;

use crate::support::probe::test_state;

#[tokio::test]
async fn test_health_reports_alive() {
    let app = create_app(test_state());
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value =
        serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.unwrap()).unwrap();
    assert_eq!(body["status"], "alive");
    assert!(body["timestamp"].is_string());
    assert!(body["uptime"].is_u64());
    let endpoints: Vec<&str> = body["endpoints"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert!(endpoints.contains(&"POST /a2a/agent/:agent_id"));
    assert!(endpoints.contains(&"GET /health"));
}
