//! apiprobe
//!
//! HTTP APIテストの実行・検証と、監視対象のヘルスチェックを提供するサーバー。
//! どちらもTTLキャッシュで冗長な通信を抑え、非同期タスクプロトコル越しにも呼び出せる。

#![warn(missing_docs)]

/// 共通型定義
pub mod common;

/// REST APIハンドラー
pub mod api;

/// TTLキャッシュ
pub mod cache;

/// CLIインターフェース
pub mod cli;

/// 設定管理（環境変数ヘルパー）
pub mod config;

/// HTTPテスト実行
pub mod executor;

/// ヘルスチェック監視
pub mod health;

/// ロギング初期化ユーティリティ
pub mod logging;

/// 結果のテキストレポート
pub mod report;

/// axumサーバー
pub mod server;

/// 協調シャットダウン
pub mod shutdown;

/// 非同期タスクプロトコル
pub mod tasks;

/// レスポンス検証エンジン
pub mod validation;

use std::sync::Arc;
use std::time::Instant;

use common::error::{ProbeError, ProbeResult};
use config::ProbeConfig;
use executor::HttpTestExecutor;
use health::HealthMonitor;
use tasks::{CallbackClient, RuleAgent, TaskAgent, TaskHandler};

/// アプリケーション状態
#[derive(Clone)]
pub struct AppState {
    /// 設定
    pub config: Arc<ProbeConfig>,
    /// 共有HTTPクライアント（接続プーリング有効）
    pub http_client: reqwest::Client,
    /// HTTPテスト実行器
    pub executor: HttpTestExecutor,
    /// ヘルスモニター
    pub health_monitor: HealthMonitor,
    /// 非同期タスクハンドラ
    pub tasks: TaskHandler,
    /// 起動時刻
    pub started_at: Instant,
    /// Cooperative shutdown controller
    pub shutdown: shutdown::ShutdownController,
}

impl AppState {
    /// 設定から状態を構築する
    pub fn new(config: ProbeConfig) -> ProbeResult<Self> {
        let http_client = reqwest::Client::builder()
            .build()
            .map_err(|e| ProbeError::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(config, http_client))
    }

    /// 既存のHTTPクライアントで状態を構築する
    pub fn with_client(config: ProbeConfig, http_client: reqwest::Client) -> Self {
        let executor = HttpTestExecutor::from_config(http_client.clone(), &config);
        let health_monitor = HealthMonitor::from_config(http_client.clone(), &config);
        let agent: Arc<dyn TaskAgent> =
            Arc::new(RuleAgent::new(executor.clone(), health_monitor.clone()));
        let tasks = TaskHandler::new(
            agent,
            CallbackClient::new(http_client.clone(), config.callback_timeout()),
            config.max_concurrent_tasks,
        );

        Self {
            config: Arc::new(config),
            http_client,
            executor,
            health_monitor,
            tasks,
            started_at: Instant::now(),
            shutdown: shutdown::ShutdownController::default(),
        }
    }

    /// タスクのエージェントを差し替える
    pub fn with_agent(mut self, agent: Arc<dyn TaskAgent>) -> Self {
        self.tasks = TaskHandler::new(
            agent,
            CallbackClient::new(self.http_client.clone(), self.config.callback_timeout()),
            self.config.max_concurrent_tasks,
        );
        self
    }
}
