//! 稼働確認API

use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

/// `GET /health` のレスポンス
#[derive(Debug, Serialize)]
pub struct AliveResponse {
    /// 常に "alive"
    pub status: &'static str,
    /// 現在時刻（RFC 3339）
    pub timestamp: String,
    /// 起動からの経過秒数
    pub uptime: u64,
    /// 公開エンドポイント一覧
    pub endpoints: &'static [&'static str],
}

/// 公開エンドポイント一覧
pub const ENDPOINTS: &[&str] = &[
    "GET /health",
    "POST /a2a/agent/:agent_id",
    "POST /api/tests",
    "POST /api/health-checks",
    "GET /api/health-status",
];

/// GET /health - プロセスの稼働確認（常に200）
pub async fn alive(State(state): State<AppState>) -> Json<AliveResponse> {
    Json(AliveResponse {
        status: "alive",
        timestamp: Utc::now().to_rfc3339(),
        uptime: state.started_at.elapsed().as_secs(),
        endpoints: ENDPOINTS,
    })
}
