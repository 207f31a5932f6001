//! Response envelopes.
//!
//! # Responsibilities
//! - Wrap handler output as `{"success": true, "data": .., "meta": ..}`
//! - Wrap failures as `{"success": false, "error": {..}, "meta": ..}`
//! - Map dispatch outcomes to HTTP status codes
//!
//! # Design Decisions
//! - Every body, success or not, carries the request ID
//! - Errors are values (`ApiError`), never panics

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::routing::HttpMethod;
use crate::schema::SchemaViolation;

/// Version string reported in every envelope.
pub const API_VERSION: &str = "v1";

/// A failure a handler or the dispatcher reports to the client.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
    pub details: Option<Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }

    /// 400 listing every schema violation found in the request.
    pub fn validation(violations: Vec<SchemaViolation>) -> Self {
        Self::bad_request("VALIDATION_ERROR", "Request validation failed")
            .with_details(json!({ "violations": violations }))
    }

    pub fn method_not_allowed(method: &str, path: &str) -> Self {
        Self::new(
            StatusCode::METHOD_NOT_ALLOWED,
            "METHOD_NOT_ALLOWED",
            format!("Method {} not allowed for {}", method, path),
        )
    }
}

/// Per-response metadata.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub request_id: String,
    pub version: &'static str,
}

impl Meta {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            version: API_VERSION,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a Value>,
}

#[derive(Debug, Serialize)]
struct Envelope<'a> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorBody<'a>>,
    meta: &'a Meta,
}

/// 200 with the handler's data.
pub fn success(data: Value, meta: &Meta) -> Response {
    let envelope = Envelope {
        success: true,
        data: Some(data),
        error: None,
        meta,
    };
    (StatusCode::OK, Json(envelope)).into_response()
}

/// `err.status` with the error envelope.
pub fn failure(err: &ApiError, meta: &Meta) -> Response {
    let envelope = Envelope {
        success: false,
        data: None,
        error: Some(ErrorBody {
            code: &err.code,
            message: &err.message,
            details: err.details.as_ref(),
        }),
        meta,
    };
    (err.status, Json(envelope)).into_response()
}

/// 405 with an `Allow` header listing the methods that would match.
pub fn method_not_allowed(err: &ApiError, allowed: &[HttpMethod], meta: &Meta) -> Response {
    let mut response = failure(err, meta);
    let allow = allowed
        .iter()
        .map(HttpMethod::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if let Ok(value) = HeaderValue::from_str(&allow) {
        response.headers_mut().insert(header::ALLOW, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_success_envelope() {
        let response = success(json!({"x": 1}), &Meta::new("req-1"));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"success": true, "data": {"x": 1}, "meta": {"requestId": "req-1", "version": "v1"}})
        );
    }

    #[tokio::test]
    async fn test_failure_envelope() {
        let err = ApiError::not_found("No route for GET /x");
        let response = failure(&err, &Meta::new("req-2"));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            json!({
                "success": false,
                "error": {"code": "NOT_FOUND", "message": "No route for GET /x"},
                "meta": {"requestId": "req-2", "version": "v1"}
            })
        );
    }

    #[tokio::test]
    async fn test_allow_header() {
        let err = ApiError::method_not_allowed("PATCH", "/items");
        let response = method_not_allowed(
            &err,
            &[HttpMethod::Get, HttpMethod::Post],
            &Meta::new("r"),
        );
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "GET, POST");
    }

    #[test]
    fn test_validation_error_details() {
        let err = ApiError::validation(vec![]);
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "VALIDATION_ERROR");
        assert_eq!(err.details, Some(json!({"violations": []})));
        assert_eq!(err.to_string(), "VALIDATION_ERROR: Request validation failed");
    }
}
