//! Middleware for the HTTP adapter

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use personachat_core::types::CORS_HEADERS;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Request logging middleware. Tags each response with an `x-request-id`.
pub async fn request_logging(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = Uuid::new_v4();
    let start_time = Instant::now();

    debug!("Incoming request {}: {} {}", request_id, method, uri);

    let mut response = next.run(request).await;

    let duration = start_time.elapsed();
    let status = response.status();

    if status.is_success() {
        info!("{} {} - {} ({:?}) [{}]", method, uri, status, duration, request_id);
    } else {
        warn!("{} {} - {} ({:?}) [{}]", method, uri, status, duration, request_id);
    }

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert("x-request-id", value);
    }

    response
}

/// Apply the fixed CORS header set, overwriting whatever a handler set
pub async fn cors_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    for (name, value) in CORS_HEADERS {
        if let Ok(name) = HeaderName::try_from(name) {
            headers.insert(name, HeaderValue::from_static(value));
        }
    }

    response
}
