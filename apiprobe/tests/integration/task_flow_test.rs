//! タスク投入からコールバックまでの統合テスト（実ポートのサーバー経由）

use apiprobe::api::create_app;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::support::http::spawn_app;
use crate::support::probe::{task_envelope, test_state, wait_for_json_requests};

async fn callback_sink() -> MockServer {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/callback"))
        .and(header("authorization", "Bearer caller-token"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock)
        .await;
    mock
}

async fn submit(server_url: &str, body: &Value) -> (u16, Value) {
    let response = reqwest::Client::new()
        .post(server_url)
        .json(body)
        .send()
        .await
        .unwrap();
    let status = response.status().as_u16();
    (status, response.json().await.unwrap())
}

#[tokio::test]
async fn test_test_instruction_completes_with_result_artifact() {
    let target = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
        .expect(1)
        .mount(&target)
        .await;
    let callbacks = callback_sink().await;
    let server = spawn_app(create_app(test_state())).await;

    let envelope = task_envelope(
        &format!("{}/callback", callbacks.uri()),
        "caller-token",
        &format!("GET {}/ok expect 200", target.uri()),
    );
    let (status, accepted) = submit(&server.url("/a2a/agent/api-tester"), &envelope).await;
    assert_eq!(status, 202);
    assert_eq!(accepted["status"], json!("success"));
    let task_id = accepted["task_id"].as_str().unwrap().to_string();

    let pushed = wait_for_json_requests(&callbacks, 1).await;
    let callback = &pushed[0];
    assert_eq!(callback["jsonrpc"], json!("2.0"));
    assert_eq!(callback["id"], json!("req-42"));
    assert_eq!(callback["result"]["id"], json!(task_id));
    assert_eq!(callback["result"]["contextId"], json!("ctx-42"));
    assert_eq!(callback["result"]["kind"], json!("task"));
    assert_eq!(callback["result"]["history"], json!([]));
    assert_eq!(callback["result"]["status"]["state"], json!("completed"));
    assert_eq!(callback["result"]["status"]["message"]["role"], json!("agent"));

    let data = &callback["result"]["artifacts"][0]["parts"][0];
    assert_eq!(data["kind"], json!("data"));
    assert_eq!(data["data"]["testStatus"], json!("PASS"));
    assert_eq!(data["data"]["totalChecks"], json!(1));

    server.stop().await;
}

#[tokio::test]
async fn test_health_instruction_reports_status() {
    let target = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&target)
        .await;
    let callbacks = callback_sink().await;
    let server = spawn_app(create_app(test_state())).await;

    let envelope = task_envelope(
        &format!("{}/callback", callbacks.uri()),
        "caller-token",
        &format!("Is {}/health alive?", target.uri()),
    );
    let (status, _) = submit(&server.url("/a2a/agent/monitor"), &envelope).await;
    assert_eq!(status, 202);

    let pushed = wait_for_json_requests(&callbacks, 1).await;
    let data = &pushed[0]["result"]["artifacts"][0]["parts"][0]["data"];
    assert_eq!(data["status"], json!("UP"));
    assert_eq!(data["statusChanged"], json!(false));

    server.stop().await;
}

#[tokio::test]
async fn test_uninterpretable_instruction_pushes_failed_callback() {
    let callbacks = callback_sink().await;
    let server = spawn_app(create_app(test_state())).await;

    let envelope = task_envelope(
        &format!("{}/callback", callbacks.uri()),
        "caller-token",
        "please run all the things",
    );
    let (status, _) = submit(&server.url("/a2a/agent/api-tester"), &envelope).await;
    assert_eq!(status, 202);

    let pushed = wait_for_json_requests(&callbacks, 1).await;
    assert_eq!(pushed[0]["result"]["status"]["state"], json!("failed"));
    assert_eq!(pushed[0]["result"]["artifacts"], json!([]));

    server.stop().await;
}

#[tokio::test]
async fn test_concurrent_tasks_for_same_target_share_one_call() {
    let target = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/shared"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&target)
        .await;
    let callbacks = callback_sink().await;
    let server = spawn_app(create_app(test_state())).await;

    let callback_url = format!("{}/callback", callbacks.uri());
    let instruction = format!("GET {}/shared", target.uri());
    let submissions = (0..5).map(|_| {
        let envelope = task_envelope(&callback_url, "caller-token", &instruction);
        let url = server.url("/a2a/agent/api-tester");
        async move { submit(&url, &envelope).await }
    });
    for (status, _) in join_spawned(submissions).await {
        assert_eq!(status, 202);
    }

    let pushed = wait_for_json_requests(&callbacks, 5).await;
    let cached = pushed
        .iter()
        .filter(|c| c["result"]["artifacts"][0]["parts"][0]["data"]["cached"] == json!(true))
        .count();
    assert_eq!(cached, 4);

    server.stop().await;
}

async fn join_spawned<F, T>(futures: impl Iterator<Item = F>) -> Vec<T>
where
    F: std::future::Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let handles: Vec<_> = futures.map(tokio::spawn).collect();
    let mut out = Vec::with_capacity(handles.len());
    for handle in handles {
        out.push(handle.await.unwrap());
    }
    out
}
