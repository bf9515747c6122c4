//! Request logging middleware.
//!
//! Tags every request with an id and logs method, path, status and latency.

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Logs at INFO for completed requests and WARN for 5xx. `/health` is not
/// logged. The id is echoed back in `x-request-id`; a caller-supplied value
/// is kept as long as it is a valid header value.
pub async fn request_logging(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    if path == "/health" {
        return next.run(request).await;
    }

    let request_id = request
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let span = tracing::info_span!("http_request", request_id = %request_id);
    let start = Instant::now();

    let mut response = next.run(request).instrument(span.clone()).await;

    let latency = start.elapsed();
    let status = response.status().as_u16();

    span.in_scope(|| {
        if status >= 500 {
            warn!(
                method = %method,
                path = %path,
                status = status,
                latency_ms = latency.as_millis(),
                "Request failed (5xx)"
            );
        } else {
            info!(
                method = %method,
                path = %path,
                status = status,
                latency_ms = latency.as_millis(),
                "Request completed"
            );
        }
    });

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}
