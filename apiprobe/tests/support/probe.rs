use std::time::Duration;

use apiprobe::config::ProbeConfig;
use apiprobe::AppState;
use serde_json::{json, Value};
use wiremock::MockServer;

/// テスト用の設定（タイムアウト短め）
#[allow(dead_code)]
pub fn test_config() -> ProbeConfig {
    ProbeConfig {
        request_timeout_ms: 2_000,
        callback_timeout_ms: 2_000,
        max_concurrent_tasks: 4,
        ..ProbeConfig::default()
    }
}

/// テスト用のアプリケーション状態
#[allow(dead_code)]
pub fn test_state() -> AppState {
    AppState::new(test_config()).unwrap()
}

/// タスク投入エンベロープ
#[allow(dead_code)]
pub fn task_envelope(callback_url: &str, token: &str, instruction: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": "req-42",
        "method": "message/send",
        "params": {
            "message": {"parts": [{"kind": "text", "text": instruction}]},
            "contextId": "ctx-42",
            "configuration": {
                "pushNotificationConfig": {"url": callback_url, "token": token}
            }
        }
    })
}

/// モックサーバーが `count` 件以上のリクエストを受けるまで待ち、ボディをJSONで返す
#[allow(dead_code)]
pub async fn wait_for_json_requests(mock: &MockServer, count: usize) -> Vec<Value> {
    for _ in 0..300 {
        let requests = mock.received_requests().await.unwrap();
        if requests.len() >= count {
            return requests
                .iter()
                .map(|r| serde_json::from_slice(&r.body).unwrap())
                .collect();
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("expected {count} request(s) on mock server");
}
