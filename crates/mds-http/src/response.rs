//! JSON response serialization and error formatting.

use serde::Serialize;

use crate::body::MdsResponseBody;
use crate::error::MdsError;

/// Content type of every JSON response.
pub const CONTENT_TYPE: &str = "application/json";

/// Header carrying the per-request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Serialize an error into the JSON error envelope.
#[must_use]
pub fn error_to_json(error: &MdsError) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "success": false,
        "error": {
            "code": error.code.as_str(),
            "message": error.message,
        },
    }))
    .expect("JSON serialization of error cannot fail")
}

/// Convert an [`MdsError`] into a complete HTTP error response.
#[must_use]
pub fn error_to_response(error: &MdsError, request_id: &str) -> http::Response<MdsResponseBody> {
    http::Response::builder()
        .status(error.status_code)
        .header("content-type", CONTENT_TYPE)
        .header(REQUEST_ID_HEADER, request_id)
        .body(MdsResponseBody::from_bytes(error_to_json(error)))
        .expect("valid error response")
}

/// Build a JSON response with the given status.
pub fn json_response<T: Serialize>(
    status: http::StatusCode,
    value: &T,
) -> Result<http::Response<MdsResponseBody>, MdsError> {
    let json = serde_json::to_vec(value)
        .map_err(|e| MdsError::internal_error("failed to serialize response").with_source(e))?;

    http::Response::builder()
        .status(status)
        .header("content-type", CONTENT_TYPE)
        .body(MdsResponseBody::from_bytes(json))
        .map_err(|e| MdsError::internal_error("failed to build response").with_source(e))
}
