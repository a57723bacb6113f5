//! レスポンス検証エンジン
//!
//! レスポンス記述子と検証ルールから、ルールごとの結果と集計を返す純粋関数。
//! ネットワークには一切依存しない。

use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::common::types::{
    ResponseSnapshot, ResponseType, RuleOutcome, TestStatus, ValidationOutcomes, ValidationSpec,
};

/// 検証対象のレスポンス
#[derive(Debug, Clone, Copy)]
pub struct ResponseDescriptor<'a> {
    /// ステータスコード
    pub status_code: u16,
    /// ヘッダー
    pub headers: &'a BTreeMap<String, String>,
    /// ボディ（取得できなかった場合はNone）
    pub body: Option<&'a str>,
    /// 経過時間（ミリ秒）
    pub elapsed_ms: u64,
    /// メディアタイプ
    pub media_type: Option<&'a str>,
}

impl<'a> From<&'a ResponseSnapshot> for ResponseDescriptor<'a> {
    fn from(snapshot: &'a ResponseSnapshot) -> Self {
        Self {
            status_code: snapshot.status_code,
            headers: &snapshot.headers,
            body: snapshot.body.as_deref(),
            elapsed_ms: snapshot.latency_ms,
            media_type: snapshot.media_type.as_deref(),
        }
    }
}

/// 検証結果と集計
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    /// ルールごとの結果
    pub outcomes: ValidationOutcomes,
    /// 総チェック数
    pub total_checks: u32,
    /// 合格チェック数
    pub passed_checks: u32,
}

impl ValidationReport {
    /// 不合格チェック数
    pub fn failed_checks(&self) -> u32 {
        self.total_checks - self.passed_checks
    }

    /// 全チェック合格ならPASS
    pub fn status(&self) -> TestStatus {
        if self.passed_checks == self.total_checks {
            TestStatus::Pass
        } else {
            TestStatus::Fail
        }
    }
}

#[derive(Default)]
struct Tally {
    total: u32,
    passed: u32,
}

impl Tally {
    fn record(&mut self, passed: bool, expected: Value, actual: Value, message: String) -> RuleOutcome {
        self.total += 1;
        if passed {
            self.passed += 1;
        }
        RuleOutcome {
            passed,
            expected,
            actual,
            message,
        }
    }
}

/// レスポンスを検証する
///
/// 宣言された各ルールは1つ以上のチェックとして数えられる。ルールが一つもなければ
/// 「2xxで成功」という暗黙のチェックを1つだけ行う。
///
/// 完全一致と範囲の両方が宣言された場合は両方を数えるが、結果の `status_code` 枠は
/// 範囲側で上書きされる。
pub fn validate(response: &ResponseDescriptor<'_>, spec: &ValidationSpec) -> ValidationReport {
    let mut tally = Tally::default();
    let mut outcomes = ValidationOutcomes::default();
    let status = response.status_code;

    if spec.is_empty() {
        record_implicit_success(&mut tally, &mut outcomes, status);
        return finish(outcomes, tally);
    }

    if let Some(expected) = spec.status_code {
        let passed = status == expected;
        outcomes.status_code = Some(tally.record(
            passed,
            json!(expected),
            json!(status),
            if passed {
                format!("Status code is {expected}")
            } else {
                format!("Expected status {expected}, got {status}")
            },
        ));
    }

    if let Some(range) = spec.status_range {
        let passed = range.contains(status);
        outcomes.status_code = Some(tally.record(
            passed,
            json!({"min": range.min, "max": range.max}),
            json!(status),
            if passed {
                format!("Status {status} within {}-{}", range.min, range.max)
            } else {
                format!("Status {status} outside {}-{}", range.min, range.max)
            },
        ));
    }

    if let Some(max) = spec.max_response_time_ms {
        let elapsed = response.elapsed_ms;
        let passed = elapsed <= max;
        outcomes.response_time = Some(tally.record(
            passed,
            json!(max),
            json!(elapsed),
            if passed {
                format!("Responded in {elapsed} ms (limit {max} ms)")
            } else {
                format!("Responded in {elapsed} ms, exceeding {max} ms")
            },
        ));
    }

    // ボディが取得できなかった場合、包含系チェックは記録しない
    if let Some(body) = response.body {
        for token in &spec.body_contains {
            let passed = body.contains(token.as_str());
            outcomes.body_contains.push(tally.record(
                passed,
                json!(token),
                json!(passed),
                if passed {
                    format!("Body contains \"{token}\"")
                } else {
                    format!("Body does not contain \"{token}\"")
                },
            ));
        }
        for token in &spec.body_not_contains {
            let passed = !body.contains(token.as_str());
            outcomes.body_not_contains.push(tally.record(
                passed,
                json!(token),
                json!(!passed),
                if passed {
                    format!("Body does not contain \"{token}\"")
                } else {
                    format!("Body unexpectedly contains \"{token}\"")
                },
            ));
        }
    }

    for name in &spec.required_headers {
        let found = response
            .headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.clone());
        let passed = found.is_some();
        outcomes.headers.push(tally.record(
            passed,
            json!(name),
            found.map(Value::String).unwrap_or(Value::Null),
            if passed {
                format!("Header \"{name}\" present")
            } else {
                format!("Header \"{name}\" missing")
            },
        ));
    }

    if let Some(expected) = spec.response_type {
        let actual = ResponseType::from_media_type(response.media_type.unwrap_or_default());
        let passed = actual == expected;
        outcomes.response_type = Some(tally.record(
            passed,
            json!(expected.as_str()),
            json!(actual.as_str()),
            if passed {
                format!("Response type is {}", actual.as_str())
            } else {
                format!(
                    "Expected {} response, got {}",
                    expected.as_str(),
                    actual.as_str()
                )
            },
        ));
    }

    // 宣言ルールがすべてスキップされた場合は暗黙の2xxチェックに戻す
    if tally.total == 0 {
        record_implicit_success(&mut tally, &mut outcomes, status);
    }

    finish(outcomes, tally)
}

fn record_implicit_success(tally: &mut Tally, outcomes: &mut ValidationOutcomes, status: u16) {
    let passed = (200..=299).contains(&status);
    outcomes.success = Some(tally.record(
        passed,
        json!("2xx"),
        json!(status),
        if passed {
            format!("HTTP {status} considered successful")
        } else {
            format!("HTTP {status} is not a successful status")
        },
    ));
}

fn finish(outcomes: ValidationOutcomes, tally: Tally) -> ValidationReport {
    ValidationReport {
        outcomes,
        total_checks: tally.total,
        passed_checks: tally.passed,
    }
}
