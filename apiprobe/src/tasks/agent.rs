//! 推論エージェント境界
//!
//! タスクの指示テキストを解釈し、HTTPテストまたはヘルスチェックを実行する協調者。
//! ハンドラはこのトレイト越しにのみ実行を委譲する。

use async_trait::async_trait;
use serde::Serialize;

use crate::common::error::{CommonError, ProbeError, ProbeResult};
use crate::common::protocol::Artifact;
use crate::common::types::{HttpMethod, TestRequest, ValidationSpec};
use crate::executor::HttpTestExecutor;
use crate::health::HealthMonitor;
use crate::report;

/// エージェントへの入力
#[derive(Debug, Clone)]
pub struct AgentRequest {
    /// タスクID
    pub task_id: String,
    /// コンテキストID
    pub context_id: String,
    /// 宛先エージェントID
    pub agent_id: String,
    /// 指示テキスト
    pub instruction: String,
}

/// エージェントの出力
#[derive(Debug, Clone)]
pub struct AgentOutput {
    /// 自由記述テキスト
    pub text: String,
    /// 構造化ツール出力
    pub artifacts: Vec<Artifact>,
}

/// 推論エージェント
#[async_trait]
pub trait TaskAgent: Send + Sync {
    /// 指示を実行する
    async fn run(&self, request: &AgentRequest) -> ProbeResult<AgentOutput>;
}

/// 指示から読み取った操作
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// HTTPテスト
    Test(TestRequest),
    /// ヘルスチェック
    HealthCheck(String),
}

const HEALTH_WORDS: &[&str] = &["health", "healthy", "uptime", "alive", "liveness"];

/// 指示テキストを解釈する
///
/// - JSONの `TestRequest` ならそのままテストとして扱う
/// - それ以外は最初の `http://` / `https://` トークンを対象URLとし、
///   health 系の語（または数値を伴わない "status"）があればヘルスチェック、
///   なければ最初に現れたメソッド名（既定GET）と `expect <code>` / `status <code>` でテストする
pub fn interpret(instruction: &str) -> ProbeResult<Intent> {
    let trimmed = instruction.trim();
    if trimmed.starts_with('{') {
        if let Ok(request) = serde_json::from_str::<TestRequest>(trimmed) {
            return Ok(Intent::Test(request));
        }
    }

    let words: Vec<&str> = trimmed.split_whitespace().collect();
    let url = words
        .iter()
        .map(|w| w.trim_matches(|c: char| matches!(c, '"' | '\'' | '<' | '>' | '(' | ')')))
        .map(|w| w.trim_end_matches(|c: char| matches!(c, ',' | '.' | ';' | '!' | '?')))
        .find(|w| w.starts_with("http://") || w.starts_with("https://"))
        .ok_or_else(|| ProbeError::Agent("no http(s) URL found in instruction".to_string()))?
        .to_string();

    let lowered: Vec<String> = words
        .iter()
        .filter(|w| !w.contains("://"))
        .map(|w| {
            w.trim_matches(|c: char| !c.is_ascii_alphanumeric())
                .to_ascii_lowercase()
        })
        .collect();

    let mut expected_status = None;
    let mut wants_health = false;
    for (i, word) in lowered.iter().enumerate() {
        let next_code = lowered
            .get(i + 1)
            .and_then(|n| n.parse::<u16>().ok())
            .filter(|code| (100..=599).contains(code));
        match word.as_str() {
            "expect" | "expecting" | "status" if next_code.is_some() => {
                expected_status = expected_status.or(next_code);
            }
            "status" => wants_health = true,
            w if HEALTH_WORDS.contains(&w) => wants_health = true,
            _ => {}
        }
    }

    if wants_health && expected_status.is_none() {
        return Ok(Intent::HealthCheck(url));
    }

    let method = lowered
        .iter()
        .find_map(|w| w.to_ascii_uppercase().parse::<HttpMethod>().ok())
        .unwrap_or_default();
    let expectations = ValidationSpec {
        status_code: expected_status,
        ..Default::default()
    };
    Ok(Intent::Test(
        TestRequest::new(method, url).with_expectations(expectations),
    ))
}

fn artifact<T: Serialize>(name: &str, value: &T) -> ProbeResult<Artifact> {
    let data = serde_json::to_value(value).map_err(CommonError::from)?;
    Ok(Artifact::data(name, data))
}

/// ルールベースのエージェント
#[derive(Clone)]
pub struct RuleAgent {
    executor: HttpTestExecutor,
    monitor: HealthMonitor,
}

impl RuleAgent {
    /// 新しいエージェントを作成
    pub fn new(executor: HttpTestExecutor, monitor: HealthMonitor) -> Self {
        Self { executor, monitor }
    }
}

#[async_trait]
impl TaskAgent for RuleAgent {
    async fn run(&self, request: &AgentRequest) -> ProbeResult<AgentOutput> {
        match interpret(&request.instruction)? {
            Intent::Test(test) => {
                tracing::debug!(task_id = %request.task_id, url = %test.url, "Agent running HTTP test");
                let result = self.executor.execute(&test).await;
                Ok(AgentOutput {
                    text: report::render_test(&result),
                    artifacts: vec![artifact("test-result", &result)?],
                })
            }
            Intent::HealthCheck(url) => {
                tracing::debug!(task_id = %request.task_id, url = %url, "Agent running health check");
                let result = self.monitor.check(&url).await;
                Ok(AgentOutput {
                    text: report::render_health(&result),
                    artifacts: vec![artifact("health-check", &result)?],
                })
            }
        }
    }
}
