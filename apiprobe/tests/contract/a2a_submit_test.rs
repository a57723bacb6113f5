//! POST /a2a/agent/:agent_id の契約テスト

use std::time::Duration;

use apiprobe::api::create_app;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::support::probe::{task_envelope, test_state};

async fn post_raw(app: Router, body: impl Into<Body>) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/a2a/agent/api-tester")
                .header("content-type", "application/json")
                .body(body.into())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn post_json(app: Router, body: &Value) -> (StatusCode, Value) {
    post_raw(app, body.to_string()).await
}

fn assert_error_shape(body: &Value, status: u16) {
    assert_eq!(body["status"], "error");
    assert_eq!(body["status_code"], json!(status));
    assert!(body["message"].is_string());
    assert!(body["data"]["details"].is_string());
}

async fn silent_callback() -> MockServer {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock)
        .await;
    mock
}

#[tokio::test]
async fn test_valid_submission_is_accepted() {
    let callbacks = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&callbacks)
        .await;
    let mut envelope = task_envelope(&callbacks.uri(), "tkn", "check health of http://127.0.0.1:9/");
    envelope["params"]["taskId"] = json!("task-contract-1");

    let (status, body) = post_json(create_app(test_state()), &envelope).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(
        body,
        json!({
            "status": "success",
            "status_code": 202,
            "message": "request received",
            "task_id": "task-contract-1"
        })
    );
}

#[tokio::test]
async fn test_missing_push_config_is_rejected_without_callback() {
    let callbacks = silent_callback().await;
    let mut envelope = task_envelope(&callbacks.uri(), "tkn", "GET http://127.0.0.1:9/");
    envelope["params"]
        .as_object_mut()
        .unwrap()
        .remove("configuration");

    let (status, body) = post_json(create_app(test_state()), &envelope).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_shape(&body, 400);
    assert!(body["data"]["details"]
        .as_str()
        .unwrap()
        .contains("pushNotificationConfig"));

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(callbacks.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_token_is_rejected() {
    let callbacks = silent_callback().await;
    let mut envelope = task_envelope(&callbacks.uri(), "tkn", "GET http://127.0.0.1:9/");
    envelope["params"]["configuration"]["pushNotificationConfig"]
        .as_object_mut()
        .unwrap()
        .remove("token");

    let (status, body) = post_json(create_app(test_state()), &envelope).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_shape(&body, 400);
}

#[tokio::test]
async fn test_missing_instruction_is_rejected() {
    let callbacks = silent_callback().await;
    let envelope = task_envelope(&callbacks.uri(), "tkn", "   ");

    let (status, body) = post_json(create_app(test_state()), &envelope).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["data"]["details"]
        .as_str()
        .unwrap()
        .contains("parts[0].text"));
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let (status, body) = post_raw(create_app(test_state()), "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_shape(&body, 400);
}

#[tokio::test]
async fn test_unsupported_method_is_rejected() {
    let callbacks = silent_callback().await;
    let mut envelope = task_envelope(&callbacks.uri(), "tkn", "GET http://127.0.0.1:9/");
    envelope["method"] = json!("tasks/get");

    let (status, body) = post_json(create_app(test_state()), &envelope).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["data"]["details"].as_str().unwrap().contains("tasks/get"));
}
