//! 指示テキスト解釈のテスト

use apiprobe::common::error::ProbeError;
use apiprobe::common::types::HttpMethod;
use apiprobe::tasks::agent::{interpret, Intent};

#[test]
fn test_url_with_trailing_punctuation() {
    let intent = interpret("Check the health of https://api.example.test/v1/health, please?").unwrap();
    assert_eq!(
        intent,
        Intent::HealthCheck("https://api.example.test/v1/health".to_string())
    );
}

#[test]
fn test_first_url_wins() {
    let Intent::Test(request) =
        interpret("POST http://a.test/items then http://b.test/items").unwrap()
    else {
        panic!("expected a test intent");
    };
    assert_eq!(request.method, HttpMethod::Post);
    assert_eq!(request.url, "http://a.test/items");
}

#[test]
fn test_out_of_range_status_is_ignored() {
    let Intent::Test(request) = interpret("GET http://a.test/ expect 42").unwrap() else {
        panic!("expected a test intent");
    };
    assert_eq!(request.expectations.status_code, None);
}

#[test]
fn test_empty_instruction_is_agent_error() {
    assert!(matches!(interpret("   "), Err(ProbeError::Agent(_))));
}
