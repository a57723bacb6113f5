//! コールバック送信
//!
//! 終端状態に達したタスクの結果を、呼び出し元が指定したURLへBearer認証付きでPOSTする。
//! 再試行はしない。

use reqwest::Client;
use std::time::Duration;

use crate::common::error::{ProbeError, ProbeResult};
use crate::common::protocol::{CallbackEnvelope, CallbackTarget};

/// コールバック送信クライアント
#[derive(Clone)]
pub struct CallbackClient {
    client: Client,
    timeout: Duration,
}

impl CallbackClient {
    /// 新しいクライアントを作成
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// コールバックを送信する
    ///
    /// 通信エラーと非2xx応答はいずれも `Err` として返す。
    pub async fn push(
        &self,
        target: &CallbackTarget,
        envelope: &CallbackEnvelope,
    ) -> ProbeResult<()> {
        let timeout_ms = self.timeout.as_millis() as u64;
        let response = self
            .client
            .post(&target.url)
            .bearer_auth(&target.token)
            .timeout(self.timeout)
            .json(envelope)
            .send()
            .await
            .map_err(|e| match ProbeError::from_transport(&e, timeout_ms) {
                ProbeError::Timeout(ms) => ProbeError::Timeout(ms),
                other => ProbeError::Callback(other.to_string()),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::Callback(format!(
                "callback endpoint responded with HTTP {status}"
            )));
        }
        Ok(())
    }
}
