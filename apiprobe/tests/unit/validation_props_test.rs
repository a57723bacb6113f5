//! 検証エンジンの集計に関する性質テスト

use std::collections::BTreeMap;

use apiprobe::common::types::{ResponseType, StatusRange, TestStatus, ValidationSpec};
use apiprobe::validation::{validate, ResponseDescriptor};
use proptest::prelude::*;

fn response_type() -> impl Strategy<Value = ResponseType> {
    prop_oneof![
        Just(ResponseType::Json),
        Just(ResponseType::Html),
        Just(ResponseType::Xml),
        Just(ResponseType::Text),
    ]
}

fn spec() -> impl Strategy<Value = ValidationSpec> {
    (
        proptest::option::of(100u16..600),
        proptest::option::of((100u16..600, 0u16..200)),
        proptest::option::of(0u64..2_000),
        proptest::collection::vec("[a-z]{1,4}", 0..4),
        proptest::collection::vec("[a-z]{1,4}", 0..4),
        proptest::collection::vec("x-[a-z]{1,6}", 0..3),
        proptest::option::of(response_type()),
    )
        .prop_map(
            |(status_code, range, max_time, contains, not_contains, headers, kind)| ValidationSpec {
                status_code,
                status_range: range.map(|(min, width)| StatusRange {
                    min,
                    max: min.saturating_add(width),
                }),
                max_response_time_ms: max_time,
                body_contains: contains,
                body_not_contains: not_contains,
                required_headers: headers,
                response_type: kind,
            },
        )
}

proptest! {
    #[test]
    fn totals_match_declared_rules(
        spec in spec(),
        status in 100u16..600,
        elapsed in 0u64..3_000,
        body in "[a-z ]{0,40}",
        header_names in proptest::collection::vec("x-[a-z]{1,6}", 0..3),
    ) {
        let mut headers: BTreeMap<String, String> =
            header_names.into_iter().map(|name| (name, "1".to_string())).collect();
        headers.insert("content-type".to_string(), "application/json".to_string());
        let response = ResponseDescriptor {
            status_code: status,
            headers: &headers,
            body: Some(body.as_str()),
            elapsed_ms: elapsed,
            media_type: Some("application/json"),
        };

        let report = validate(&response, &spec);
        let expected_total = if spec.is_empty() { 1 } else { spec.declared_checks() as u32 };

        prop_assert_eq!(report.total_checks, expected_total);
        prop_assert!(report.passed_checks <= report.total_checks);
        prop_assert_eq!(report.failed_checks(), report.total_checks - report.passed_checks);
        prop_assert_eq!(
            report.status() == TestStatus::Pass,
            report.passed_checks == report.total_checks
        );
        // 同じ入力なら同じ結果
        prop_assert_eq!(validate(&response, &spec), report);
    }

    #[test]
    fn missing_body_never_yields_zero_checks(
        spec in spec(),
        status in 100u16..600,
    ) {
        let headers: BTreeMap<String, String> = BTreeMap::new();
        let response = ResponseDescriptor {
            status_code: status,
            headers: &headers,
            body: None,
            elapsed_ms: 0,
            media_type: None,
        };

        let report = validate(&response, &spec);
        let body_rules = (spec.body_contains.len() + spec.body_not_contains.len()) as u32;
        let expected_total = (spec.declared_checks() as u32 - body_rules).max(1);

        prop_assert_eq!(report.total_checks, expected_total);
        if !(200..=299).contains(&status) && expected_total == 1 && report.outcomes.success.is_some() {
            prop_assert_eq!(report.status(), TestStatus::Fail);
        }
    }
}
