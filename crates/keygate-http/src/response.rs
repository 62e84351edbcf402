//! JSON response construction.
//!
//! Errors use the uniform body:
//!
//! ```json
//! { "status": 404, "reason": "Not found specified object" }
//! ```

use keygate_model::GatewayError;
use serde_json::Value;

use crate::body::GatewayResponseBody;

/// Content type for every gateway response.
pub const CONTENT_TYPE: &str = "application/json";

/// Header carrying the per-request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Build a JSON response with the given status.
#[must_use]
pub fn json_response(
    status: http::StatusCode,
    body: &Value,
    request_id: &str,
) -> http::Response<GatewayResponseBody> {
    let json = serde_json::to_vec(body).expect("JSON value serialization cannot fail");
    http::Response::builder()
        .status(status)
        .header(http::header::CONTENT_TYPE, CONTENT_TYPE)
        .header(REQUEST_ID_HEADER, request_id)
        .body(GatewayResponseBody::from_json(json))
        .expect("valid JSON response")
}

/// Convert a `GatewayError` into a complete HTTP error response.
#[must_use]
pub fn error_to_response(
    error: &GatewayError,
    request_id: &str,
) -> http::Response<GatewayResponseBody> {
    json_response(error.status_code, &error.to_body(), request_id)
}

/// Response for health check probes.
#[must_use]
pub fn health_check_response() -> http::Response<GatewayResponseBody> {
    http::Response::builder()
        .status(http::StatusCode::OK)
        .header(http::header::CONTENT_TYPE, CONTENT_TYPE)
        .body(GatewayResponseBody::from_static(r#"{"status":"running"}"#))
        .expect("static health response should be valid")
}
