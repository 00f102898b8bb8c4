//! Hugging Face Router connector for the PersonaChat proxy
//!
//! Speaks the OpenAI-compatible chat completions protocol exposed by
//! `router.huggingface.co`, or any other endpoint with the same shape.

use async_trait::async_trait;
use personachat_core::prelude::*;
use reqwest::{Client, Response};
use serde_json::Value;
use tracing::{debug, warn};

/// HF Router implementation of ChatUpstream
pub struct HfRouterConnector {
    client: Client,
    api_url: String,
}

impl HfRouterConnector {
    /// Create a connector posting to `api_url`.
    ///
    /// The client keeps reqwest's default timeouts.
    pub fn new(api_url: impl Into<String>) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .build()
            .map_err(|e| UpstreamError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            api_url: api_url.into(),
        })
    }

    /// Create a connector for the configured upstream URL
    pub fn from_config(config: &ProxyConfig) -> Result<Self, UpstreamError> {
        Self::new(config.api_url.clone())
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

#[async_trait]
impl ChatUpstream for HfRouterConnector {
    async fn send(&self, request: &UpstreamChatRequest, secret: &str) -> Result<UpstreamReply, UpstreamError> {
        debug!("Forwarding chat request to {}", self.api_url);

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", secret))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = read_error_body(response).await.unwrap_or_default();
            return Ok(UpstreamReply::Failure {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(network_error)?;
        let data: Value = serde_json::from_slice(&bytes)
            .map_err(|e| UpstreamError::Decode(e.to_string()))?;

        debug!("Upstream answered {}", status);
        Ok(UpstreamReply::Success(data))
    }
}

/// Best-effort read of an error body. `None` if the body could not be read.
async fn read_error_body(response: Response) -> Option<String> {
    match response.text().await {
        Ok(text) => Some(text),
        Err(e) => {
            warn!("Could not read upstream error body: {}", e);
            None
        }
    }
}

fn network_error(e: reqwest::Error) -> UpstreamError {
    UpstreamError::Network {
        message: e.to_string(),
        status: e.status().map(|status| status.as_u16()),
    }
}
