//! ヘルスモニター
//!
//! 監視対象URLごとに UP/DOWN の状態を持ち、状態遷移を検出する。
//! 状態は `UNKNOWN → UP ↔ DOWN` と遷移し、UNKNOWN は初回チェック前にのみ存在する。

use chrono::Utc;
use reqwest::Client;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::cache::TtlCache;
use crate::common::error::ProbeError;
use crate::common::types::{HealthCacheEntry, HealthCheckResult, HealthStatus};
use crate::config::ProbeConfig;

/// ヘルスモニター
#[derive(Clone)]
pub struct HealthMonitor {
    client: Client,
    cache: TtlCache<String, HealthCheckResult>,
    states: Arc<RwLock<HashMap<String, HealthCacheEntry>>>,
    timeout: Duration,
}

impl HealthMonitor {
    /// 新しいモニターを作成
    pub fn new(client: Client, cache_ttl: Duration, timeout: Duration) -> Self {
        Self {
            client,
            cache: TtlCache::new(cache_ttl),
            states: Arc::new(RwLock::new(HashMap::new())),
            timeout,
        }
    }

    /// 設定から作成
    pub fn from_config(client: Client, config: &ProbeConfig) -> Self {
        Self::new(client, config.health_cache_ttl(), config.request_timeout())
    }

    /// ヘルスチェックを実行する
    ///
    /// TTL内なら前回の結果を `cached=true` / `status_changed=false` で返す。
    /// キャッシュミス時のみ実際にリクエストを送り、状態を更新する。
    pub async fn check(&self, url: &str) -> HealthCheckResult {
        let (mut result, cached) = self
            .cache
            .get_or_refresh(url.to_string(), self.cache.default_ttl(), || {
                self.observe(url)
            })
            .await;
        if cached {
            debug!(url = %url, status = %result.status, "Returning cached health status");
            result.cached = true;
            result.status_changed = false;
        }
        result
    }

    /// 直近の観測状態（未観測ならNone = UNKNOWN）
    pub async fn status(&self, url: &str) -> Option<HealthStatus> {
        self.states.read().await.get(url).map(|entry| entry.status)
    }

    /// 直近の観測エントリ
    pub async fn last_observation(&self, url: &str) -> Option<HealthCacheEntry> {
        self.states.read().await.get(url).cloned()
    }

    /// 全監視対象の直近観測
    pub async fn snapshot(&self) -> BTreeMap<String, HealthCacheEntry> {
        self.states
            .read()
            .await
            .iter()
            .map(|(url, entry)| (url.clone(), entry.clone()))
            .collect()
    }

    async fn observe(&self, url: &str) -> HealthCheckResult {
        let started = Instant::now();
        let outcome = self.client.get(url).timeout(self.timeout).send().await;

        let (status, status_code, latency_ms, error) = match outcome {
            Ok(response) => {
                let latency_ms = started.elapsed().as_millis() as u64;
                let code = response.status();
                if code.is_success() {
                    (HealthStatus::Up, Some(code.as_u16()), Some(latency_ms), None)
                } else {
                    (
                        HealthStatus::Down,
                        Some(code.as_u16()),
                        Some(latency_ms),
                        Some(format!("HTTP {code}")),
                    )
                }
            }
            Err(err) => {
                let err = ProbeError::from_transport(&err, self.timeout.as_millis() as u64);
                (HealthStatus::Down, None, None, Some(err.to_string()))
            }
        };

        let timestamp = Utc::now();
        let previous_status = {
            let mut states = self.states.write().await;
            states
                .insert(
                    url.to_string(),
                    HealthCacheEntry {
                        status,
                        timestamp,
                        last_error: error.clone(),
                    },
                )
                .map(|entry| entry.status)
        };
        // 初回観測は変化として扱わない
        let status_changed = matches!(previous_status, Some(previous) if previous != status);

        if status_changed {
            match status {
                HealthStatus::Up => info!(
                    url = %url,
                    from = ?previous_status,
                    to = %status,
                    "Health status changed"
                ),
                HealthStatus::Down => warn!(
                    url = %url,
                    from = ?previous_status,
                    to = %status,
                    error = ?error,
                    "Health status changed"
                ),
            }
        } else {
            debug!(url = %url, status = %status, "Health check completed");
        }

        HealthCheckResult {
            url: url.to_string(),
            status,
            previous_status,
            status_changed,
            cached: false,
            timestamp,
            status_code,
            latency_ms,
            error,
        }
    }
}
