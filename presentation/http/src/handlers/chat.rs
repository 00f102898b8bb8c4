//! Chat proxy handler

use crate::AppState;
use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};
use personachat_core::prelude::*;
use tracing::debug;

/// Hand the raw method and body to the request proxy
pub async fn proxy_chat(State(state): State<AppState>, method: Method, body: Bytes) -> Response {
    debug!("Chat proxy invoked: {} ({} bytes)", method, body.len());

    // Non-UTF-8 bodies are treated as absent and fail prompt validation
    let body = if body.is_empty() {
        None
    } else {
        std::str::from_utf8(&body).ok().map(str::to_string)
    };

    let request = ProxyRequest::new(method.as_str(), body);
    into_http_response(state.proxy.handle(request).await)
}

/// Convert a proxy response into an axum response
pub fn into_http_response(response: ProxyResponse) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let mut builder = Response::builder().status(status);
    for (name, value) in response.headers {
        builder = builder.header(name, value);
    }

    builder
        .body(Body::from(response.body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
