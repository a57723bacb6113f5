//! 通信プロトコル定義
//!
//! 呼び出し元↔apiprobe間のJSON-RPCタスク投入メッセージとコールバックペイロード

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::error::{ProbeError, ProbeResult};

/// JSON-RPCバージョン
pub const JSONRPC_VERSION: &str = "2.0";

/// 受信したJSON-RPCエンベロープ（メソッド判別前）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// "2.0" 固定
    #[serde(default)]
    pub jsonrpc: String,
    /// リクエストID（コールバックでそのまま返す）
    #[serde(default)]
    pub id: Value,
    /// メソッド名
    #[serde(default)]
    pub method: String,
    /// パラメータ
    #[serde(default)]
    pub params: Value,
}

/// `message/send` / `execute` のパラメータ
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSendParams {
    /// 指示メッセージ
    #[serde(default)]
    pub message: Option<InboundMessage>,
    /// コンテキストID
    #[serde(default)]
    pub context_id: Option<String>,
    /// タスクID
    #[serde(default)]
    pub task_id: Option<String>,
    /// 設定（コールバック先）
    #[serde(default)]
    pub configuration: Option<TaskConfiguration>,
}

/// 受信メッセージ
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundMessage {
    /// メッセージパーツ（先頭のtextのみ使用）
    #[serde(default)]
    pub parts: Vec<InboundPart>,
}

/// 受信メッセージパーツ
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InboundPart {
    /// 種別
    #[serde(default)]
    pub kind: Option<String>,
    /// テキスト
    #[serde(default)]
    pub text: Option<String>,
}

/// タスク設定
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskConfiguration {
    /// プッシュ通知先
    #[serde(default)]
    pub push_notification_config: Option<PushNotificationConfig>,
}

/// プッシュ通知先
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PushNotificationConfig {
    /// コールバックURL
    #[serde(default)]
    pub url: Option<String>,
    /// Bearerトークン
    #[serde(default)]
    pub token: Option<String>,
}

/// 認識済みJSON-RPCメソッド
#[derive(Debug, Clone)]
pub enum A2aRequest {
    /// `message/send`
    MessageSend(MessageSendParams),
    /// `execute`
    Execute(MessageSendParams),
}

impl A2aRequest {
    /// メソッド名でパラメータを型付けする
    pub fn from_envelope(envelope: &JsonRpcRequest) -> ProbeResult<Self> {
        if envelope.jsonrpc != JSONRPC_VERSION {
            return Err(ProbeError::InvalidRequest(format!(
                "jsonrpc must be \"{JSONRPC_VERSION}\""
            )));
        }
        let params = || -> ProbeResult<MessageSendParams> {
            if envelope.params.is_null() {
                return Err(ProbeError::MissingField("params"));
            }
            serde_json::from_value(envelope.params.clone())
                .map_err(|e| ProbeError::InvalidRequest(format!("invalid params: {e}")))
        };
        match envelope.method.as_str() {
            "message/send" => Ok(A2aRequest::MessageSend(params()?)),
            "execute" => Ok(A2aRequest::Execute(params()?)),
            "" => Err(ProbeError::MissingField("method")),
            other => Err(ProbeError::UnsupportedMethod(other.to_string())),
        }
    }

    fn params(&self) -> &MessageSendParams {
        match self {
            A2aRequest::MessageSend(p) | A2aRequest::Execute(p) => p,
        }
    }
}

/// コールバック先
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackTarget {
    /// URL
    pub url: String,
    /// Bearerトークン
    pub token: String,
}

/// 検証済みのタスク投入
#[derive(Debug, Clone)]
pub struct TaskSubmission {
    /// 元のJSON-RPC ID
    pub rpc_id: Value,
    /// タスクID
    pub task_id: String,
    /// コンテキストID
    pub context_id: String,
    /// 指示テキスト
    pub instruction: String,
    /// コールバック先
    pub callback: CallbackTarget,
}

impl TaskSubmission {
    /// エンベロープを検証してタスク投入に変換する
    ///
    /// コールバックURL、トークン、指示テキストのいずれかが欠けていればエラー。
    pub fn from_envelope(envelope: &JsonRpcRequest) -> ProbeResult<Self> {
        let request = A2aRequest::from_envelope(envelope)?;
        let params = request.params();

        let push = params
            .configuration
            .as_ref()
            .and_then(|c| c.push_notification_config.as_ref())
            .ok_or(ProbeError::MissingField(
                "params.configuration.pushNotificationConfig",
            ))?;
        let url = non_blank(push.url.as_deref()).ok_or(ProbeError::MissingField(
            "params.configuration.pushNotificationConfig.url",
        ))?;
        let token = non_blank(push.token.as_deref()).ok_or(ProbeError::MissingField(
            "params.configuration.pushNotificationConfig.token",
        ))?;
        let instruction = params
            .message
            .as_ref()
            .and_then(|m| m.parts.first())
            .and_then(|p| non_blank(p.text.as_deref()))
            .ok_or(ProbeError::MissingField("params.message.parts[0].text"))?;

        Ok(Self {
            rpc_id: envelope.id.clone(),
            task_id: params
                .task_id
                .clone()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            context_id: params
                .context_id
                .clone()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            instruction: instruction.to_string(),
            callback: CallbackTarget {
                url: url.to_string(),
                token: token.to_string(),
            },
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// 受付応答（202）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AcceptedResponse {
    /// "success"
    pub status: String,
    /// 202
    pub status_code: u16,
    /// "request received"
    pub message: String,
    /// タスクID
    pub task_id: String,
}

impl AcceptedResponse {
    /// 受付応答を作成
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            status_code: 202,
            message: "request received".to_string(),
            task_id: task_id.into(),
        }
    }
}

/// エラー応答
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    /// "error"
    pub status: String,
    /// HTTPステータスコード
    pub status_code: u16,
    /// メッセージ
    pub message: String,
    /// 詳細
    pub data: ErrorData,
}

/// エラー詳細
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorData {
    /// 詳細メッセージ
    pub details: String,
}

/// タスク状態
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    /// 受信直後（検証前）
    Received,
    /// 受付済み
    Accepted,
    /// 実行中
    Running,
    /// 完了
    Completed,
    /// 失敗
    Failed,
}

impl TaskState {
    /// 終端状態か
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed)
    }

    /// 遷移可能か
    pub fn can_transition_to(&self, next: TaskState) -> bool {
        use TaskState::*;
        matches!(
            (self, next),
            (Received, Accepted)
                | (Received, Failed)
                | (Accepted, Running)
                | (Accepted, Failed)
                | (Running, Completed)
                | (Running, Failed)
        )
    }

    /// 文字列表現
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Received => "received",
            TaskState::Accepted => "accepted",
            TaskState::Running => "running",
            TaskState::Completed => "completed",
            TaskState::Failed => "failed",
        }
    }
}

/// メッセージ/アーティファクトのパーツ
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Part {
    /// テキスト
    Text {
        /// 本文
        text: String,
    },
    /// 構造化データ
    Data {
        /// データ
        data: Value,
    },
}

/// エージェントからのメッセージ
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentMessage {
    /// メッセージID
    pub message_id: String,
    /// "agent"
    pub role: String,
    /// パーツ
    pub parts: Vec<Part>,
    /// "message"
    pub kind: String,
}

impl AgentMessage {
    /// テキスト1パーツのエージェントメッセージ
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            message_id: Uuid::new_v4().to_string(),
            role: "agent".to_string(),
            parts: vec![Part::Text { text: text.into() }],
            kind: "message".to_string(),
        }
    }
}

/// アーティファクト
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    /// アーティファクトID
    pub artifact_id: String,
    /// 名前
    pub name: String,
    /// パーツ
    pub parts: Vec<Part>,
}

impl Artifact {
    /// 構造化データ1パーツのアーティファクト
    pub fn data(name: impl Into<String>, data: Value) -> Self {
        Self {
            artifact_id: Uuid::new_v4().to_string(),
            name: name.into(),
            parts: vec![Part::Data { data }],
        }
    }
}

/// タスクステータス
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskStatusPayload {
    /// 状態
    pub state: TaskState,
    /// 時刻
    pub timestamp: DateTime<Utc>,
    /// エージェントメッセージ
    pub message: AgentMessage,
}

/// コールバックで送るタスク
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskPayload {
    /// タスクID
    pub id: String,
    /// コンテキストID
    pub context_id: String,
    /// ステータス
    pub status: TaskStatusPayload,
    /// アーティファクト
    pub artifacts: Vec<Artifact>,
    /// 履歴（常に空）
    pub history: Vec<Value>,
    /// "task"
    pub kind: String,
}

/// コールバックのJSON-RPCレスポンス
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CallbackEnvelope {
    /// "2.0"
    pub jsonrpc: String,
    /// 元のリクエストID
    pub id: Value,
    /// タスク
    pub result: TaskPayload,
}

impl CallbackEnvelope {
    /// 終端状態のタスクからコールバックを組み立てる
    pub fn new(
        rpc_id: Value,
        task_id: &str,
        context_id: &str,
        state: TaskState,
        text: impl Into<String>,
        artifacts: Vec<Artifact>,
    ) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: rpc_id,
            result: TaskPayload {
                id: task_id.to_string(),
                context_id: context_id.to_string(),
                status: TaskStatusPayload {
                    state,
                    timestamp: Utc::now(),
                    message: AgentMessage::text(text),
                },
                artifacts,
                history: Vec::new(),
                kind: "task".to_string(),
            },
        }
    }
}
