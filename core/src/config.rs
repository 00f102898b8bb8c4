//! Configuration for the request proxy

use serde::{Deserialize, Serialize};

/// Default upstream chat completions endpoint
pub const DEFAULT_API_URL: &str = "https://router.huggingface.co/v1/chat/completions";

/// Default model identifier
pub const DEFAULT_MODEL: &str = "Qwen/Qwen2.5-7B-Instruct";

/// Name of the environment variable carrying the upstream secret
pub const TOKEN_VAR: &str = "HF_TOKEN";

/// Process-wide proxy configuration, resolved once at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Upstream chat completions URL
    pub api_url: String,
    /// Bearer token for the upstream. No default
    pub token: Option<String>,
    /// Model identifier sent with every request
    pub model: String,
}

impl ProxyConfig {
    pub fn new() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Set the upstream URL
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Set the upstream secret
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the model to use
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// The secret, if one is configured. An empty value counts as unset.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|token| !token.is_empty())
    }

    /// Secret obfuscated for logs: `hf_***` followed by its last four characters
    pub fn masked_token(&self) -> String {
        match self.token() {
            Some(token) => {
                let tail: String = token
                    .chars()
                    .rev()
                    .take(4)
                    .collect::<Vec<_>>()
                    .into_iter()
                    .rev()
                    .collect();
                format!("hf_***{}", tail)
            }
            None => "missing".to_string(),
        }
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self::new()
    }
}
