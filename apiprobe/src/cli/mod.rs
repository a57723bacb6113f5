//! CLI module for apiprobe
//!
//! サーバー起動と、単発のテスト・ヘルスチェック実行を提供する。

pub mod check;
pub mod serve;

use clap::{Parser, Subcommand};

/// apiprobe - HTTP API test runner and health monitor
#[derive(Parser, Debug)]
#[command(name = "apiprobe")]
#[command(version, about, long_about = None)]
#[command(after_help = r#"ENVIRONMENT VARIABLES:
    APIPROBE_HOST                        Bind address (default: 0.0.0.0)
    APIPROBE_PORT                        Listen port (default: 8080)
    APIPROBE_LOG_LEVEL                   Log level (default: info)
    APIPROBE_LOG_FORMAT                  Set to "json" for JSON logs
    APIPROBE_HEALTH_CHECK_URL            Target for periodic health checks
    APIPROBE_HEALTH_CHECK_INTERVAL_SECS  Health check interval (default: 60)
    APIPROBE_HEALTH_CACHE_TTL_MS         Health cache TTL (default: 300000)
    APIPROBE_TEST_CACHE_TTL_MS           Test cache TTL (default: 300000)
    APIPROBE_REQUEST_TIMEOUT_MS          Outbound request timeout (default: 10000)
    APIPROBE_CALLBACK_TIMEOUT_MS         Callback push timeout (default: 10000)
    APIPROBE_MAX_CONCURRENT_TASKS        Concurrently running tasks (default: 16)
"#)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the server
    Serve(serve::ServeArgs),
    /// Run one HTTP test and print the report
    Test(test::TestArgs),
    /// Run one health check and print the result
    Check(check::CheckArgs),
}
