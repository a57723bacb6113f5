//! HTTPテスト実行
//!
//! リクエストを1回発行してレイテンシを計測し、レスポンスを検証した結果をキャッシュする。
//! 通信エラーやタイムアウトも FAIL の結果として返し、呼び出し側へ例外を伝播させない。

use reqwest::{header::CONTENT_TYPE, Client, Method};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::cache::TtlCache;
use crate::common::error::{ProbeError, ProbeResult};
use crate::common::types::{
    HttpMethod, RequestSnapshot, ResponseSnapshot, ResponseType, TestRequest, TestResult,
    ValidationSpec,
};
use crate::config::ProbeConfig;
use crate::validation::{validate, ResponseDescriptor};

/// テスト結果のキャッシュキー
///
/// メソッド・URL・実際に送信するボディに加え、ヘッダーと検証ルールも含める。
/// ヘッダーや期待値だけが異なるリクエスト同士が同じ結果を共有しないようにするため。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TestCacheKey {
    method: HttpMethod,
    url: String,
    body: Option<String>,
    headers: BTreeMap<String, String>,
    expectations: ValidationSpec,
}

impl From<&TestRequest> for TestCacheKey {
    fn from(request: &TestRequest) -> Self {
        Self {
            method: request.method,
            url: request.url.clone(),
            body: request.effective_body().map(str::to_string),
            headers: request.headers.clone(),
            expectations: request.expectations.clone(),
        }
    }
}

/// HTTPテスト実行器
#[derive(Clone)]
pub struct HttpTestExecutor {
    client: Client,
    cache: TtlCache<TestCacheKey, TestResult>,
    default_timeout: Duration,
}

impl HttpTestExecutor {
    /// 新しい実行器を作成
    pub fn new(client: Client, default_cache_ttl: Duration, default_timeout: Duration) -> Self {
        Self {
            client,
            cache: TtlCache::new(default_cache_ttl),
            default_timeout,
        }
    }

    /// 設定から作成
    pub fn from_config(client: Client, config: &ProbeConfig) -> Self {
        Self::new(client, config.test_cache_ttl(), config.request_timeout())
    }

    /// 結果キャッシュ
    pub fn cache(&self) -> &TtlCache<TestCacheKey, TestResult> {
        &self.cache
    }

    /// テストを実行する
    ///
    /// TTL内に同じキーで実行済みなら、ネットワークに出ずに `cached=true` の結果を返す。
    /// 失敗結果も成功結果と同じようにキャッシュされる。
    pub async fn execute(&self, request: &TestRequest) -> TestResult {
        let ttl = request
            .cache_ttl_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| self.cache.default_ttl());
        let key = TestCacheKey::from(request);

        let (mut result, cached) = self
            .cache
            .get_or_refresh(key, ttl, || self.run(request))
            .await;

        if cached {
            debug!(
                method = %request.method,
                url = %request.url,
                "Returning cached test result"
            );
            result.cached = true;
        }
        result
    }

    async fn run(&self, request: &TestRequest) -> TestResult {
        let snapshot = RequestSnapshot::from(request);
        info!(method = %request.method, url = %request.url, "Executing HTTP test");

        let response = match self.send(request).await {
            Ok(response) => response,
            Err(err) => {
                warn!(
                    method = %request.method,
                    url = %request.url,
                    error = %err,
                    "HTTP test failed before a response was received"
                );
                return TestResult::transport_failure(snapshot, err.to_string());
            }
        };

        let report = validate(&ResponseDescriptor::from(&response), &request.expectations);
        let result = TestResult {
            test_status: report.status(),
            cached: false,
            timestamp: chrono::Utc::now(),
            request: snapshot,
            failed_checks: report.failed_checks(),
            total_checks: report.total_checks,
            passed_checks: report.passed_checks,
            validations: report.outcomes,
            response: Some(response),
            error: None,
        };

        debug!(
            url = %request.url,
            status = result.test_status.as_str(),
            passed = result.passed_checks,
            total = result.total_checks,
            "HTTP test completed"
        );
        result
    }

    async fn send(&self, request: &TestRequest) -> ProbeResult<ResponseSnapshot> {
        let timeout = request
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(self.default_timeout);
        let timeout_ms = timeout.as_millis() as u64;

        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), &request.url)
            .timeout(timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.effective_body() {
            let has_content_type = request
                .headers
                .keys()
                .any(|name| name.eq_ignore_ascii_case(CONTENT_TYPE.as_str()));
            if !has_content_type && serde_json::from_str::<serde_json::Value>(body).is_ok() {
                builder = builder.header(CONTENT_TYPE, "application/json");
            }
            builder = builder.body(body.to_string());
        }

        let started = Instant::now();
        let response = builder
            .send()
            .await
            .map_err(|e| ProbeError::from_transport(&e, timeout_ms))?;
        let latency_ms = started.elapsed().as_millis() as u64;

        let status_code = response.status().as_u16();
        let mut headers: BTreeMap<String, String> = BTreeMap::new();
        for (name, value) in response.headers() {
            let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
            headers
                .entry(name.as_str().to_string())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(&value);
                })
                .or_insert(value);
        }
        let media_type = headers.get(CONTENT_TYPE.as_str()).cloned();

        let body = match response.text().await {
            Ok(text) => Some(text),
            Err(err) => {
                debug!(url = %request.url, error = %err, "Response body could not be read");
                None
            }
        };

        // 構造化デコードは表示用。失敗しても生テキストのまま扱う
        let json = match media_type.as_deref().map(ResponseType::from_media_type) {
            Some(ResponseType::Json) => body
                .as_deref()
                .and_then(|text| serde_json::from_str(text).ok()),
            _ => None,
        };

        Ok(ResponseSnapshot {
            status_code,
            headers,
            body,
            json,
            media_type,
            latency_ms,
        })
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Patch => Method::PATCH,
    }
}
