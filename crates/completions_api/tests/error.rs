use reqwest::StatusCode;

use completions_api::error::parse_error_message;

#[test]
fn parse_error_message_uses_json_message_and_code() {
    let body = r#"{"error":{"code":"model_not_found","message":"unknown model"}}"#;
    let message = parse_error_message(StatusCode::NOT_FOUND, body);
    assert_eq!(message, "unknown model (model_not_found)");
}

#[test]
fn parse_error_message_falls_back_to_type_qualifier() {
    let body = r#"{"error":{"type":"invalid_request_error","message":"bad input"}}"#;
    let message = parse_error_message(StatusCode::BAD_REQUEST, body);
    assert_eq!(message, "bad input (invalid_request_error)");
}

#[test]
fn parse_error_message_falls_back_to_raw_body() {
    let message = parse_error_message(StatusCode::BAD_GATEWAY, "upstream exploded");
    assert_eq!(message, "upstream exploded");
}

#[test]
fn parse_error_message_uses_reason_for_empty_body() {
    let message = parse_error_message(StatusCode::SERVICE_UNAVAILABLE, "");
    assert_eq!(message, "Service Unavailable");
}
