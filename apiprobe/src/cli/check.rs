//! check サブコマンド
//!
//! ヘルスチェックを1回実行し、UPなら終了コード0、DOWNなら1を返す。

use clap::Args;
use std::process::ExitCode;

use crate::common::error::{CommonError, ProbeError, ProbeResult};
use crate::common::types::HealthStatus;
use crate::config::ProbeConfig;
use crate::health::HealthMonitor;
use crate::report;

/// check サブコマンドの引数
#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Target URL (defaults to APIPROBE_HEALTH_CHECK_URL)
    pub url: Option<String>,

    /// Print the result as JSON instead of a text report
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

/// ヘルスチェックを実行して結果を表示する
pub async fn execute(args: &CheckArgs, config: ProbeConfig) -> ProbeResult<ExitCode> {
    let url = args
        .url
        .clone()
        .or_else(|| config.health_check_url.clone())
        .ok_or(ProbeError::MissingField("url"))?;
    let client = reqwest::Client::builder()
        .build()
        .map_err(|e| ProbeError::Internal(format!("failed to build HTTP client: {e}")))?;
    let monitor = HealthMonitor::from_config(client, &config);

    let result = monitor.check(&url).await;
    if args.json {
        let json = serde_json::to_string_pretty(&result).map_err(CommonError::from)?;
        println!("{json}");
    } else {
        println!("{}", report::render_health(&result));
    }

    Ok(match result.status {
        HealthStatus::Up => ExitCode::SUCCESS,
        HealthStatus::Down => ExitCode::FAILURE,
    })
}
