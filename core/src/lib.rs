//! # PersonaChat Core
//!
//! Core types, traits, and the request proxy pipeline for PersonaChat.
//! The proxy validates an inbound chat request, attaches the upstream
//! credential, forwards the prompt to a chat-completion API and translates
//! whatever comes back into a client-facing response. Upstream connectors
//! and presentation adapters plug in through the traits defined here.

pub mod types;
pub mod traits;
pub mod errors;
pub mod config;
pub mod proxy;

// Re-export commonly used types and traits
pub use types::{ChatRequest, ChatResult, ProxyRequest, ProxyResponse, RequestMethod, UpstreamChatRequest, UpstreamReply};
pub use traits::{ChatUpstream, PresentationAdapter};
pub use errors::{ProxyError, UpstreamError, PresentationError};
pub use config::ProxyConfig;
pub use proxy::RequestProxy;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::types::*;
    pub use crate::traits::*;
    pub use crate::errors::*;
    pub use crate::config::*;
    pub use crate::proxy::*;
    pub use async_trait::async_trait;
}
