//! 定期ヘルスチェック
//!
//! 起動直後に1回チェックし、以降は一定間隔で [`HealthMonitor::check`] を呼び出す。
//! 各ティックは独立しており、失敗してもログに残すだけでティッカーは止まらない。

use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::monitor::HealthMonitor;

struct Running {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// ヘルスチェックティッカー
pub struct HealthTicker {
    monitor: HealthMonitor,
    url: String,
    interval: Duration,
    running: Mutex<Option<Running>>,
}

impl HealthTicker {
    /// 新しいティッカーを作成（まだ起動しない）
    pub fn new(monitor: HealthMonitor, url: impl Into<String>, interval: Duration) -> Self {
        Self {
            monitor,
            url: url.into(),
            // tokio::time::interval はゼロ間隔を受け付けない
            interval: interval.max(Duration::from_millis(1)),
            running: Mutex::new(None),
        }
    }

    /// 監視対象URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// 実行中か
    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// バックグラウンドで監視を開始
    ///
    /// 既に実行中なら警告を出して何もしない。開始した場合は `true`。
    pub fn start(&self) -> bool {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if running.is_some() {
            warn!(url = %self.url, "Health ticker is already running");
            return false;
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(tick_loop(
            self.monitor.clone(),
            self.url.clone(),
            self.interval,
            cancel.clone(),
        ));
        *running = Some(Running { cancel, handle });

        info!(
            url = %self.url,
            interval_ms = self.interval.as_millis() as u64,
            "Health ticker started"
        );
        true
    }

    /// 監視を停止
    ///
    /// 既に停止していれば警告を出して何もしない。停止した場合は `true`。
    pub fn stop(&self) -> bool {
        let taken = self
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match taken {
            Some(Running { cancel, handle }) => {
                cancel.cancel();
                handle.abort();
                info!(url = %self.url, "Health ticker stopped");
                true
            }
            None => {
                warn!(url = %self.url, "Health ticker is not running");
                false
            }
        }
    }
}

impl Drop for HealthTicker {
    fn drop(&mut self) {
        if let Some(Running { cancel, handle }) = self
            .running
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            cancel.cancel();
            handle.abort();
        }
    }
}

async fn tick_loop(
    monitor: HealthMonitor,
    url: String,
    period: Duration,
    cancel: CancellationToken,
) {
    // 最初の tick() は即座に完了するため、起動直後のチェックを兼ねる
    let mut timer = interval(period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = timer.tick() => {}
        }

        let mut tick = {
            let monitor = monitor.clone();
            let url = url.clone();
            tokio::spawn(async move { monitor.check(&url).await })
        };

        tokio::select! {
            _ = cancel.cancelled() => {
                tick.abort();
                break;
            }
            joined = &mut tick => match joined {
                Ok(result) => debug!(
                    url = %result.url,
                    status = %result.status,
                    cached = result.cached,
                    status_changed = result.status_changed,
                    "Health tick completed"
                ),
                Err(e) => error!(url = %url, error = %e, "Health tick failed"),
            },
        }
    }
}
