//! Per-request spans.
//!
//! Every request span carries the `x-request-id` assigned by the request-id
//! middleware so log lines from one request can be correlated.

use axum::http::Request;
use tracing::Span;

use crate::http::request::request_id;

/// Span factory for `TraceLayer::make_span_with`.
pub fn make_request_span<B>(request: &Request<B>) -> Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id(request).unwrap_or("unknown"),
    )
}
