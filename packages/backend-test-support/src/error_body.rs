//! Assertions for the JSON error contract.
//!
//! Every error response carries a JSON body and a non-empty `x-trace-id`
//! header. These helpers check both without depending on backend types.

use actix_web::body::MessageBody;
use actix_web::dev::ServiceResponse;
use actix_web::http::header::{HeaderMap, CONTENT_TYPE};
use actix_web::http::StatusCode;
use serde_json::Value;

/// Read a response into its status, headers and parsed JSON body.
pub async fn read_json<B: MessageBody>(resp: ServiceResponse<B>) -> (StatusCode, HeaderMap, Value) {
    let status = resp.status();
    let headers = resp.headers().clone();
    let body = actix_web::test::read_body(resp).await;
    let json = serde_json::from_slice(&body).unwrap_or_else(|_| {
        panic!(
            "response body should be JSON, got: {}",
            String::from_utf8_lossy(&body)
        )
    });
    (status, headers, json)
}

/// Assert the error response has `expected_status`, exactly `expected_body`,
/// a JSON content type and a trace id. Returns the trace id.
pub async fn assert_error_response<B: MessageBody>(
    resp: ServiceResponse<B>,
    expected_status: StatusCode,
    expected_body: Value,
) -> String {
    let (status, headers, body) = read_json(resp).await;

    assert_eq!(status, expected_status, "unexpected status, body: {body}");
    assert_eq!(body, expected_body);

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(
        content_type.starts_with("application/json"),
        "Content-Type must be application/json (got {content_type})"
    );

    trace_id(&headers)
}

/// The `x-trace-id` header value; panics when missing or empty.
pub fn trace_id(headers: &HeaderMap) -> String {
    let value = headers
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .expect("x-trace-id header should be present and valid UTF-8");
    assert!(!value.is_empty(), "x-trace-id header should not be empty");
    value.to_string()
}
