//! Traits at the seams of PersonaChat: the upstream connector and the
//! presentation adapter that exposes the proxy.

use crate::errors::{PresentationError, UpstreamError};
use crate::proxy::RequestProxy;
use crate::types::{UpstreamChatRequest, UpstreamReply};
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for upstream chat-completion connectors
#[async_trait]
pub trait ChatUpstream: Send + Sync {
    /// Send one request with the given bearer secret. A single attempt, no retry.
    ///
    /// Non-success statuses are not errors: they come back as
    /// [`UpstreamReply::Failure`]. Errors are reserved for transport faults and
    /// undecodable success bodies.
    async fn send(&self, request: &UpstreamChatRequest, secret: &str) -> Result<UpstreamReply, UpstreamError>;
}

/// Trait for presentation layer adapters
#[async_trait]
pub trait PresentationAdapter: Send + Sync {
    /// Start serving the proxy. Returns when the server stops.
    async fn start(&self, proxy: Arc<RequestProxy>) -> Result<(), PresentationError>;
}
