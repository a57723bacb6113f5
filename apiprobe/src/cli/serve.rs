//! serve サブコマンド
//!
//! HTTPサーバーを起動し、監視対象が設定されていれば定期ヘルスチェックも開始する。

use clap::Args;

use crate::common::error::{ProbeError, ProbeResult};
use crate::config::ProbeConfig;
use crate::health::HealthTicker;
use crate::AppState;

/// serve サブコマンドの引数
#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Listen port (overrides APIPROBE_PORT)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Bind address (overrides APIPROBE_HOST)
    #[arg(short = 'H', long)]
    pub host: Option<String>,
}

impl ServeArgs {
    /// 引数で設定を上書きする
    pub fn apply(&self, mut config: ProbeConfig) -> ProbeConfig {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        config
    }
}

/// サーバーを起動し、終了まで待つ
pub async fn execute(args: &ServeArgs, config: ProbeConfig) -> ProbeResult<()> {
    let config = args.apply(config);
    let bind_addr = config.bind_addr();
    let state = AppState::new(config)?;

    let ticker = state.config.health_check_url.as_ref().map(|url| {
        HealthTicker::new(
            state.health_monitor.clone(),
            url.clone(),
            state.config.health_check_interval(),
        )
    });
    if let Some(ticker) = &ticker {
        ticker.start();
    }

    let result = crate::server::run(state, &bind_addr).await;

    if let Some(ticker) = &ticker {
        ticker.stop();
    }
    result.map_err(|e| ProbeError::Internal(format!("server error on {bind_addr}: {e}")))
}
