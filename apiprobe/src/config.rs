//! Configuration management via environment variables
//!
//! Provides helper functions for reading environment variables with fallback
//! to legacy variable names with warning logs, and the `ProbeConfig` struct
//! assembled from them.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Get an environment variable with fallback to a legacy name
///
/// If the new variable name is set, returns its value.
/// If only the legacy variable name is set, returns its value
/// and logs a deprecation warning.
///
/// # Example
/// ```
/// use apiprobe::config::get_env_with_fallback;
///
/// let port = get_env_with_fallback("APIPROBE_PORT", "PORT");
/// ```
pub fn get_env_with_fallback(new_name: &str, old_name: &str) -> Option<String> {
    if let Ok(val) = std::env::var(new_name) {
        return Some(val);
    }
    if let Ok(val) = std::env::var(old_name) {
        tracing::warn!(
            "Environment variable '{}' is deprecated, use '{}' instead",
            old_name,
            new_name
        );
        return Some(val);
    }
    None
}

/// Get an environment variable with fallback and default value
pub fn get_env_with_fallback_or(new_name: &str, old_name: &str, default: &str) -> String {
    get_env_with_fallback(new_name, old_name).unwrap_or_else(|| default.to_string())
}

/// Get an environment variable with fallback, parsing to a specific type
///
/// Returns `default` if neither is set or parsing fails.
pub fn get_env_with_fallback_parse<T: std::str::FromStr>(
    new_name: &str,
    old_name: &str,
    default: T,
) -> T {
    get_env_with_fallback(new_name, old_name)
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// apiprobe設定
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProbeConfig {
    /// ホストアドレス (デフォルト: "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,

    /// ポート番号 (デフォルト: 8080)
    #[serde(default = "default_port")]
    pub port: u16,

    /// 定期ヘルスチェック対象URL（未設定ならティッカーを起動しない）
    #[serde(default)]
    pub health_check_url: Option<String>,

    /// ヘルスチェック間隔（秒）(デフォルト: 60)
    #[serde(default = "default_health_check_interval")]
    pub health_check_interval_secs: u64,

    /// ヘルスキャッシュTTL（ミリ秒）(デフォルト: 300000)
    #[serde(default = "default_cache_ttl")]
    pub health_cache_ttl_ms: u64,

    /// テストキャッシュTTL（ミリ秒）(デフォルト: 300000)
    #[serde(default = "default_cache_ttl")]
    pub test_cache_ttl_ms: u64,

    /// リクエストタイムアウト（ミリ秒）(デフォルト: 10000)
    #[serde(default = "default_timeout")]
    pub request_timeout_ms: u64,

    /// コールバック送信タイムアウト（ミリ秒）(デフォルト: 10000)
    #[serde(default = "default_timeout")]
    pub callback_timeout_ms: u64,

    /// 同時実行タスク数の上限 (デフォルト: 16)
    #[serde(default = "default_max_concurrent_tasks")]
    pub max_concurrent_tasks: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_health_check_interval() -> u64 {
    60
}

fn default_cache_ttl() -> u64 {
    crate::common::types::DEFAULT_CACHE_TTL_MS
}

fn default_timeout() -> u64 {
    crate::common::types::DEFAULT_TIMEOUT_MS
}

fn default_max_concurrent_tasks() -> usize {
    16
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            health_check_url: None,
            health_check_interval_secs: default_health_check_interval(),
            health_cache_ttl_ms: default_cache_ttl(),
            test_cache_ttl_ms: default_cache_ttl(),
            request_timeout_ms: default_timeout(),
            callback_timeout_ms: default_timeout(),
            max_concurrent_tasks: default_max_concurrent_tasks(),
        }
    }
}

impl ProbeConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: get_env_with_fallback_or("APIPROBE_HOST", "HOST", &defaults.host),
            port: get_env_with_fallback_parse("APIPROBE_PORT", "PORT", defaults.port),
            health_check_url: get_env_with_fallback(
                "APIPROBE_HEALTH_CHECK_URL",
                "HEALTH_CHECK_URL",
            )
            .filter(|url| !url.trim().is_empty()),
            health_check_interval_secs: get_env_with_fallback_parse(
                "APIPROBE_HEALTH_CHECK_INTERVAL_SECS",
                "HEALTH_CHECK_INTERVAL",
                defaults.health_check_interval_secs,
            ),
            health_cache_ttl_ms: get_env_with_fallback_parse(
                "APIPROBE_HEALTH_CACHE_TTL_MS",
                "HEALTH_CACHE_TTL",
                defaults.health_cache_ttl_ms,
            ),
            test_cache_ttl_ms: get_env_with_fallback_parse(
                "APIPROBE_TEST_CACHE_TTL_MS",
                "TEST_CACHE_TTL",
                defaults.test_cache_ttl_ms,
            ),
            request_timeout_ms: get_env_with_fallback_parse(
                "APIPROBE_REQUEST_TIMEOUT_MS",
                "REQUEST_TIMEOUT",
                defaults.request_timeout_ms,
            ),
            callback_timeout_ms: get_env_with_fallback_parse(
                "APIPROBE_CALLBACK_TIMEOUT_MS",
                "CALLBACK_TIMEOUT",
                defaults.callback_timeout_ms,
            ),
            max_concurrent_tasks: get_env_with_fallback_parse(
                "APIPROBE_MAX_CONCURRENT_TASKS",
                "MAX_CONCURRENT_TASKS",
                defaults.max_concurrent_tasks,
            )
            .max(1),
        }
    }

    /// Bind address for the HTTP server.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Health check interval.
    pub fn health_check_interval(&self) -> Duration {
        Duration::from_secs(self.health_check_interval_secs)
    }

    /// Health cache TTL.
    pub fn health_cache_ttl(&self) -> Duration {
        Duration::from_millis(self.health_cache_ttl_ms)
    }

    /// Default TTL for test results.
    pub fn test_cache_ttl(&self) -> Duration {
        Duration::from_millis(self.test_cache_ttl_ms)
    }

    /// Default outbound request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Callback push timeout.
    pub fn callback_timeout(&self) -> Duration {
        Duration::from_millis(self.callback_timeout_ms)
    }
}
