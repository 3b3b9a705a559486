use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

use super::account::ACCOUNT_ID_HEADER;

const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Logs one line per request and one per response, tagged with a request id.
///
/// An incoming `x-request-id` is kept; otherwise a fresh one is generated. The
/// id is echoed back on the response.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let account = request
        .headers()
        .get(ACCOUNT_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_owned();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    tracing::info!(
        request_id = %request_id,
        account = %account,
        method = %method,
        uri = %uri,
        "→ Request"
    );

    let mut response = next.run(request).await;
    let status = response.status();
    let latency = start.elapsed();

    if status.is_server_error() {
        tracing::warn!(
            request_id = %request_id,
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            latency_ms = %latency.as_millis(),
            "← Response"
        );
    } else {
        tracing::info!(
            request_id = %request_id,
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            latency_ms = %latency.as_millis(),
            "← Response"
        );
    }

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(REQUEST_ID_HEADER.clone(), value);
    }

    response
}
