//! ロギング初期化
//!
//! `APIPROBE_LOG_LEVEL`（未設定なら `RUST_LOG`、どちらもなければ `info`）でフィルタし、
//! `APIPROBE_LOG_FORMAT=json` でJSON出力に切り替える。

use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVE: &str = "info";

/// 有効なフィルタ指定
pub fn filter_directive() -> String {
    std::env::var("APIPROBE_LOG_LEVEL")
        .or_else(|_| std::env::var("RUST_LOG"))
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_DIRECTIVE.to_string())
}

/// JSON出力が要求されているか
pub fn json_requested() -> bool {
    std::env::var("APIPROBE_LOG_FORMAT")
        .map(|value| value.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

/// グローバルsubscriberを設定する
///
/// 不正なフィルタ指定は `info` にフォールバックする。二重初期化はエラー。
pub fn init() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_new(filter_directive())
        .or_else(|_| EnvFilter::try_new(DEFAULT_DIRECTIVE))?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json_requested() {
        builder.json().try_init()
    } else {
        builder.try_init()
    }
}
