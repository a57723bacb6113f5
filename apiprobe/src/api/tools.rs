//! テスト・ヘルスチェックの直接実行API

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;
use std::collections::BTreeMap;

use super::error::AppError;
use crate::common::error::{CommonError, ProbeError};
use crate::common::types::{HealthCacheEntry, HealthCheckResult, TestRequest, TestResult};
use crate::AppState;

/// `POST /api/health-checks` のリクエスト
#[derive(Debug, Default, Deserialize)]
pub struct HealthCheckRequest {
    /// 対象URL（省略時は設定済みの監視対象）
    #[serde(default)]
    pub url: Option<String>,
}

/// POST /api/tests - HTTPテストを実行（PASS/FAILに関わらず200）
pub async fn run_test(
    State(state): State<AppState>,
    payload: Result<Json<TestRequest>, JsonRejection>,
) -> Result<Json<TestResult>, AppError> {
    let Json(request) = payload?;
    if request.url.trim().is_empty() {
        return Err(ProbeError::MissingField("url").into());
    }
    Ok(Json(state.executor.execute(&request).await))
}

/// POST /api/health-checks - ヘルスチェックを実行
pub async fn run_health_check(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<HealthCheckResult>, AppError> {
    let request: HealthCheckRequest = if body.iter().all(u8::is_ascii_whitespace) {
        HealthCheckRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(CommonError::from).map_err(ProbeError::from)?
    };
    let url = request
        .url
        .filter(|url| !url.trim().is_empty())
        .or_else(|| state.config.health_check_url.clone())
        .ok_or(ProbeError::MissingField("url"))?;
    Ok(Json(state.health_monitor.check(&url).await))
}

/// GET /api/health-status - 監視対象ごとの直近状態
pub async fn health_status(
    State(state): State<AppState>,
) -> Json<BTreeMap<String, HealthCacheEntry>> {
    Json(state.health_monitor.snapshot().await)
}
