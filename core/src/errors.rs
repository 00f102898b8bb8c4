//! Error types for PersonaChat

use crate::types::{ChatResult, DebugInfo, ProxyResponse, ERROR_BODY_LIMIT};
use thiserror::Error;

/// Failure paths of the request proxy. Each variant maps to exactly one
/// client-facing response.
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Prompt is required")]
    PromptRequired,

    #[error("Missing {0} environment variable")]
    MissingCredential(&'static str),

    #[error("Upstream error from HF Router")]
    Upstream { status: u16, body: String },

    #[error("Internal server error")]
    Internal(#[from] UpstreamError),
}

impl ProxyError {
    /// HTTP status code for this failure
    pub fn status(&self) -> u16 {
        match self {
            ProxyError::MethodNotAllowed => 405,
            ProxyError::PromptRequired => 400,
            ProxyError::MissingCredential(_) => 500,
            ProxyError::Upstream { status, .. } => mirrored_status(*status),
            ProxyError::Internal(_) => 500,
        }
    }

    /// Diagnostic payload, only present for server-side failures
    pub fn debug_info(&self) -> Option<DebugInfo> {
        match self {
            ProxyError::Upstream { status, body } => Some(DebugInfo {
                status: Some(*status),
                body: Some(truncate_chars(body, ERROR_BODY_LIMIT).to_string()),
                ..Default::default()
            }),
            ProxyError::Internal(source) => Some(DebugInfo {
                status: source.status(),
                message: Some(source.to_string()),
                name: Some(source.name().to_string()),
                ..Default::default()
            }),
            _ => None,
        }
    }

    /// Convert into the client-facing response
    pub fn into_response(self) -> ProxyResponse {
        let result = ChatResult::failure(self.to_string(), self.debug_info());
        ProxyResponse::json(self.status(), &result)
    }
}

/// Errors raised while talking to the upstream inference service
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("{message}")]
    Network { message: String, status: Option<u16> },

    #[error("Failed to parse upstream response: {0}")]
    Decode(String),

    #[error("Failed to create HTTP client: {0}")]
    ClientBuild(String),
}

impl UpstreamError {
    /// Short error kind reported as `debug.name`
    pub fn name(&self) -> &'static str {
        match self {
            UpstreamError::Network { .. } => "NetworkError",
            UpstreamError::Decode(_) => "DecodeError",
            UpstreamError::ClientBuild(_) => "ClientBuildError",
        }
    }

    /// HTTP status associated with the failure, if the transport knew one
    pub fn status(&self) -> Option<u16> {
        match self {
            UpstreamError::Network { status, .. } => *status,
            _ => None,
        }
    }
}

/// Errors related to presentation adapters
#[derive(Error, Debug)]
pub enum PresentationError {
    #[error("Server startup failed: {0}")]
    StartupFailed(String),

    #[error("Server shutdown failed: {0}")]
    ShutdownFailed(String),
}

/// Upstream statuses outside the valid HTTP range fall back to 500
fn mirrored_status(status: u16) -> u16 {
    if (100..=599).contains(&status) {
        status
    } else {
        500
    }
}

/// Cut `text` to at most `limit` characters without splitting a code point
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}
