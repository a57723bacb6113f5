//! 人間向けレポート
//!
//! テスト結果・ヘルスチェック結果をプレーンテキストに整形する。
//! コールバックのテキストパーツとCLI出力で共有する。

use std::fmt::Write;

use crate::common::types::{HealthCheckResult, RuleOutcome, TestResult, ValidationOutcomes};

fn outcomes(validations: &ValidationOutcomes) -> Vec<&RuleOutcome> {
    validations
        .success
        .iter()
        .chain(validations.status_code.iter())
        .chain(validations.response_time.iter())
        .chain(validations.body_contains.iter())
        .chain(validations.body_not_contains.iter())
        .chain(validations.headers.iter())
        .chain(validations.response_type.iter())
        .collect()
}

/// テスト結果を整形
pub fn render_test(result: &TestResult) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "{} {} {} ({}/{} checks passed",
        result.test_status.as_str(),
        result.request.method,
        result.request.url,
        result.passed_checks,
        result.total_checks
    );
    if let Some(response) = &result.response {
        let _ = write!(
            out,
            ", HTTP {}, {} ms",
            response.status_code, response.latency_ms
        );
    }
    out.push(')');
    if result.cached {
        out.push_str(" [cached]");
    }

    for outcome in outcomes(&result.validations) {
        let mark = if outcome.passed { "ok" } else { "FAIL" };
        let _ = write!(out, "\n  [{mark}] {}", outcome.message);
    }
    if let Some(error) = &result.error {
        let _ = write!(out, "\n  error: {error}");
    }
    out
}

/// ヘルスチェック結果を整形
pub fn render_health(result: &HealthCheckResult) -> String {
    let mut out = format!("{} is {}", result.url, result.status);
    match (result.status_code, result.latency_ms) {
        (Some(code), Some(latency)) => {
            let _ = write!(out, " (HTTP {code}, {latency} ms)");
        }
        (Some(code), None) => {
            let _ = write!(out, " (HTTP {code})");
        }
        _ => {}
    }
    if result.cached {
        out.push_str(" [cached]");
    }
    if result.status_changed {
        if let Some(previous) = result.previous_status {
            let _ = write!(out, "\n  status changed: {previous} -> {}", result.status);
        }
    }
    if let Some(error) = &result.error {
        let _ = write!(out, "\n  error: {error}");
    }
    out
}
