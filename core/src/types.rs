//! Core data types for PersonaChat

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sampling temperature sent with every upstream request
pub const TEMPERATURE: f64 = 0.7;

/// Maximum number of tokens the upstream may generate per reply
pub const MAX_TOKENS: u32 = 256;

/// Upstream error bodies are cut to this many characters before being echoed
pub const ERROR_BODY_LIMIT: usize = 2000;

/// CORS headers attached to every proxy response
pub const CORS_HEADERS: [(&str, &str); 3] = [
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Headers", "Content-Type, Authorization"),
    ("Access-Control-Allow-Methods", "POST, OPTIONS"),
];

/// Inbound chat request from the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Fully assembled prompt text (character identity, history and new input)
    pub prompt: String,
}

impl ChatRequest {
    /// Parse and validate a raw request body.
    ///
    /// An absent or empty body is read as `{}`. Returns `None` when the body
    /// is not valid JSON, is not an object, or carries no non-empty string
    /// `prompt`.
    pub fn from_body(body: Option<&str>) -> Option<Self> {
        let raw = match body {
            Some(text) if !text.is_empty() => text,
            _ => "{}",
        };

        let value: Value = serde_json::from_str(raw).ok()?;
        let prompt = value.get("prompt")?.as_str()?;
        if prompt.is_empty() {
            return None;
        }

        Some(Self {
            prompt: prompt.to_string(),
        })
    }
}

/// Message in an upstream chat completion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamMessage {
    pub role: String,
    pub content: String,
}

/// OpenAI-compatible chat completion request sent upstream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamChatRequest {
    pub model: String,
    pub messages: Vec<UpstreamMessage>,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl UpstreamChatRequest {
    /// Build a single-turn user request with the fixed sampling parameters
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: vec![UpstreamMessage {
                role: "user".to_string(),
                content: prompt.into(),
            }],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        }
    }
}

/// What the upstream sent back, when it answered at all
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamReply {
    /// 2xx status with a JSON body
    Success(Value),
    /// Non-success status with the body read as text (empty if unreadable)
    Failure { status: u16, body: String },
}

/// Diagnostic details attached to server-side failures
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Client-facing result payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatResult {
    Reply {
        response: String,
    },
    Failure {
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        debug: Option<DebugInfo>,
    },
}

impl ChatResult {
    pub fn reply(response: impl Into<String>) -> Self {
        ChatResult::Reply {
            response: response.into(),
        }
    }

    pub fn failure(error: impl Into<String>, debug: Option<DebugInfo>) -> Self {
        ChatResult::Failure {
            error: error.into(),
            debug,
        }
    }
}

/// HTTP method of an inbound request, as far as the proxy cares
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestMethod {
    Options,
    Post,
    Other(String),
}

impl From<&str> for RequestMethod {
    fn from(method: &str) -> Self {
        match method {
            "OPTIONS" => RequestMethod::Options,
            "POST" => RequestMethod::Post,
            other => RequestMethod::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestMethod::Options => write!(f, "OPTIONS"),
            RequestMethod::Post => write!(f, "POST"),
            RequestMethod::Other(method) => write!(f, "{}", method),
        }
    }
}

/// HTTP-shaped inbound request handed to the proxy
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: RequestMethod,
    pub body: Option<String>,
}

impl ProxyRequest {
    pub fn new(method: impl Into<RequestMethod>, body: Option<String>) -> Self {
        Self {
            method: method.into(),
            body,
        }
    }

    /// Convenience constructor for a POST with a body
    pub fn post(body: impl Into<String>) -> Self {
        Self::new(RequestMethod::Post, Some(body.into()))
    }
}

/// HTTP-shaped response produced by the proxy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyResponse {
    pub status: u16,
    pub headers: Vec<(&'static str, &'static str)>,
    pub body: String,
}

impl ProxyResponse {
    /// Response to a CORS preflight: CORS headers and nothing else
    pub fn preflight() -> Self {
        Self {
            status: 200,
            headers: CORS_HEADERS.to_vec(),
            body: String::new(),
        }
    }

    /// JSON response carrying the given result
    pub fn json(status: u16, result: &ChatResult) -> Self {
        let mut headers = CORS_HEADERS.to_vec();
        headers.push(("Content-Type", "application/json"));

        // Serializing plain strings and integers into JSON cannot fail
        let body = serde_json::to_string(result).unwrap_or_else(|_| "{}".to_string());

        Self {
            status,
            headers,
            body,
        }
    }

    /// Look up a header value by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&'static str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| *value)
    }
}
