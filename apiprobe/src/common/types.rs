//! 共通型定義
//!
//! テストリクエスト、検証ルール、テスト結果、ヘルス状態などのドメイン型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::error::CommonError;

/// デフォルトのテストキャッシュTTL（ミリ秒）
pub const DEFAULT_CACHE_TTL_MS: u64 = 300_000;

/// デフォルトのリクエストタイムアウト（ミリ秒）
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// HTTPメソッド
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET
    #[default]
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
    /// PATCH
    Patch,
}

impl HttpMethod {
    /// 文字列表現
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
        }
    }

    /// リクエストボディを送信するメソッドか
    ///
    /// GET/DELETEは呼び出し側がボディを指定しても送信しない。
    pub fn sends_body(&self) -> bool {
        !matches!(self, HttpMethod::Get | HttpMethod::Delete)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            "PATCH" => Ok(HttpMethod::Patch),
            other => Err(CommonError::Validation(format!(
                "unsupported HTTP method: {other}"
            ))),
        }
    }
}

/// レスポンス種別（メディアタイプから推定）
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// application/json 等
    Json,
    /// text/html
    Html,
    /// application/xml, text/xml
    Xml,
    /// その他すべて
    Text,
}

impl ResponseType {
    /// メディアタイプから種別を推定する（json → html → xml → text の優先順）
    pub fn from_media_type(media_type: &str) -> Self {
        let media_type = media_type.to_ascii_lowercase();
        if media_type.contains("json") {
            ResponseType::Json
        } else if media_type.contains("html") {
            ResponseType::Html
        } else if media_type.contains("xml") {
            ResponseType::Xml
        } else {
            ResponseType::Text
        }
    }

    /// 文字列表現
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::Json => "json",
            ResponseType::Html => "html",
            ResponseType::Xml => "xml",
            ResponseType::Text => "text",
        }
    }
}

/// ステータスコード範囲 `[min, max]`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct StatusRange {
    /// 下限（含む）
    pub min: u16,
    /// 上限（含む）
    pub max: u16,
}

impl StatusRange {
    /// 範囲内か
    pub fn contains(&self, status: u16) -> bool {
        self.min <= status && status <= self.max
    }
}

/// 検証ルールの集合
///
/// 各ルールは独立しており、宣言されたものだけがチェック数に寄与する。
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidationSpec {
    /// 期待するステータスコード（完全一致）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// 期待するステータスコード範囲
    #[serde(skip_serializing_if = "Option::is_none", alias = "statusCodeRange")]
    pub status_range: Option<StatusRange>,
    /// 最大レスポンスタイム（ミリ秒）
    #[serde(
        skip_serializing_if = "Option::is_none",
        rename = "maxResponseTime",
        alias = "maxResponseTimeMs"
    )]
    pub max_response_time_ms: Option<u64>,
    /// ボディに含まれるべき文字列
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub body_contains: Vec<String>,
    /// ボディに含まれてはならない文字列
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub body_not_contains: Vec<String>,
    /// 必須レスポンスヘッダー名
    #[serde(skip_serializing_if = "Vec::is_empty", alias = "headers")]
    pub required_headers: Vec<String>,
    /// 期待するレスポンス種別
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_type: Option<ResponseType>,
}

impl ValidationSpec {
    /// 宣言された個別チェック数（ルール未宣言なら0）
    pub fn declared_checks(&self) -> usize {
        usize::from(self.status_code.is_some())
            + usize::from(self.status_range.is_some())
            + usize::from(self.max_response_time_ms.is_some())
            + self.body_contains.len()
            + self.body_not_contains.len()
            + self.required_headers.len()
            + usize::from(self.response_type.is_some())
    }

    /// ルールが一つも宣言されていないか
    pub fn is_empty(&self) -> bool {
        self.declared_checks() == 0
    }
}

/// HTTPテストリクエスト
///
/// 構築後は不変。`cache_ttl_ms` / `timeout_ms` が未指定の場合は実行側の既定値を使う。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TestRequest {
    /// 対象URL
    pub url: String,
    /// HTTPメソッド（デフォルト: GET）
    #[serde(default)]
    pub method: HttpMethod,
    /// リクエストヘッダー
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// リクエストボディ（文字列以外のJSONはシリアライズして送信）
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "body_from_value"
    )]
    pub body: Option<String>,
    /// 検証ルール
    #[serde(default, alias = "validations")]
    pub expectations: ValidationSpec,
    /// キャッシュTTL（ミリ秒）
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "cacheTTL",
        alias = "cacheTtlMs"
    )]
    pub cache_ttl_ms: Option<u64>,
    /// タイムアウト（ミリ秒）
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "timeout",
        alias = "timeoutMs"
    )]
    pub timeout_ms: Option<u64>,
}

fn body_from_value<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

impl TestRequest {
    /// GETリクエストを作成
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    /// 任意メソッドのリクエストを作成
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            headers: BTreeMap::new(),
            body: None,
            expectations: ValidationSpec::default(),
            cache_ttl_ms: None,
            timeout_ms: None,
        }
    }

    /// ヘッダーを追加
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// ボディを設定
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// 検証ルールを設定
    pub fn with_expectations(mut self, expectations: ValidationSpec) -> Self {
        self.expectations = expectations;
        self
    }

    /// キャッシュTTLを設定
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl_ms = Some(ttl.as_millis() as u64);
        self
    }

    /// タイムアウトを設定
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// 実際に送信されるボディ（GET/DELETEでは常にNone）
    pub fn effective_body(&self) -> Option<&str> {
        if self.method.sends_body() {
            self.body.as_deref()
        } else {
            None
        }
    }
}

/// テスト判定
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum TestStatus {
    /// 全チェック合格
    Pass,
    /// 一つ以上のチェックが不合格、または通信エラー
    Fail,
}

impl TestStatus {
    /// 文字列表現
    pub fn as_str(&self) -> &'static str {
        match self {
            TestStatus::Pass => "PASS",
            TestStatus::Fail => "FAIL",
        }
    }
}

/// 単一チェックの結果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuleOutcome {
    /// 合否
    pub passed: bool,
    /// 期待値
    pub expected: Value,
    /// 実測値
    pub actual: Value,
    /// 説明
    pub message: String,
}

/// ルールごとの検証結果
///
/// `status_code` は完全一致と範囲指定で共有するスロット。両方宣言された場合は範囲側の結果で上書きされる。
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutcomes {
    /// ステータスコード
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<RuleOutcome>,
    /// レスポンスタイム
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time: Option<RuleOutcome>,
    /// ボディ包含
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub body_contains: Vec<RuleOutcome>,
    /// ボディ非包含
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub body_not_contains: Vec<RuleOutcome>,
    /// 必須ヘッダー
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<RuleOutcome>,
    /// レスポンス種別
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_type: Option<RuleOutcome>,
    /// ルール未宣言時の暗黙チェック（2xx）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<RuleOutcome>,
}

/// リクエストのスナップショット
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestSnapshot {
    /// メソッド
    pub method: HttpMethod,
    /// URL
    pub url: String,
    /// ヘッダー
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// 送信したボディ
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl From<&TestRequest> for RequestSnapshot {
    fn from(request: &TestRequest) -> Self {
        Self {
            method: request.method,
            url: request.url.clone(),
            headers: request.headers.clone(),
            body: request.effective_body().map(str::to_string),
        }
    }
}

/// レスポンスのスナップショット
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResponseSnapshot {
    /// ステータスコード
    pub status_code: u16,
    /// レスポンスヘッダー（名前は小文字）
    pub headers: BTreeMap<String, String>,
    /// ボディ（取得できなかった場合はNone）
    pub body: Option<String>,
    /// 構造化デコード結果（JSONの場合のみ、失敗時はNone）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<Value>,
    /// メディアタイプ
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    /// レイテンシ（ミリ秒）
    pub latency_ms: u64,
}

/// テスト結果
///
/// 不変。キャッシュに格納される正規の値。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    /// 判定
    pub test_status: TestStatus,
    /// キャッシュから返されたか
    pub cached: bool,
    /// 実行時刻
    pub timestamp: DateTime<Utc>,
    /// リクエスト
    pub request: RequestSnapshot,
    /// レスポンス（通信エラー時はNone）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponseSnapshot>,
    /// ルールごとの検証結果
    pub validations: ValidationOutcomes,
    /// 総チェック数
    pub total_checks: u32,
    /// 合格チェック数
    pub passed_checks: u32,
    /// 不合格チェック数
    pub failed_checks: u32,
    /// 通信エラー
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TestResult {
    /// レスポンス取得前に失敗した場合の結果（1チェック中0合格）
    pub fn transport_failure(request: RequestSnapshot, error: impl Into<String>) -> Self {
        Self {
            test_status: TestStatus::Fail,
            cached: false,
            timestamp: Utc::now(),
            request,
            response: None,
            validations: ValidationOutcomes::default(),
            total_checks: 1,
            passed_checks: 0,
            failed_checks: 1,
            error: Some(error.into()),
        }
    }

    /// 合格か
    pub fn is_pass(&self) -> bool {
        self.test_status == TestStatus::Pass
    }
}

/// ヘルス状態
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthStatus {
    /// 2xx応答
    Up,
    /// 非2xx応答または通信エラー
    Down,
}

impl HealthStatus {
    /// 文字列表現
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Up => "UP",
            HealthStatus::Down => "DOWN",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 監視対象ごとの最新ヘルス状態
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HealthCacheEntry {
    /// 状態
    pub status: HealthStatus,
    /// 観測時刻
    pub timestamp: DateTime<Utc>,
    /// 直近のエラー
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// ヘルスチェック結果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckResult {
    /// 監視対象URL
    pub url: String,
    /// 判定後の状態
    pub status: HealthStatus,
    /// 直前の状態（初回観測時はNone）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_status: Option<HealthStatus>,
    /// 状態が変化したか
    pub status_changed: bool,
    /// キャッシュから返されたか
    pub cached: bool,
    /// 観測時刻
    pub timestamp: DateTime<Utc>,
    /// HTTPステータスコード
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// レイテンシ（ミリ秒）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    /// エラー
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
