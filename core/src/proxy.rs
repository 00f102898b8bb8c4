//! The request proxy pipeline: validate, authenticate, forward, translate.

use crate::config::{ProxyConfig, TOKEN_VAR};
use crate::errors::ProxyError;
use crate::traits::ChatUpstream;
use crate::types::*;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Stateless handler brokering chat turns between the client and the upstream.
///
/// Shares only read-only configuration and the connector, so a single
/// instance can serve any number of concurrent requests.
#[derive(Clone)]
pub struct RequestProxy {
    config: Arc<ProxyConfig>,
    upstream: Arc<dyn ChatUpstream>,
}

impl RequestProxy {
    /// Create a new proxy over the given upstream connector
    pub fn new(config: ProxyConfig, upstream: Arc<dyn ChatUpstream>) -> Self {
        Self {
            config: Arc::new(config),
            upstream,
        }
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Handle one inbound request. Every path returns a well-formed response.
    pub async fn handle(&self, request: ProxyRequest) -> ProxyResponse {
        match request.method {
            RequestMethod::Options => {
                debug!("Answering CORS preflight");
                ProxyResponse::preflight()
            }
            RequestMethod::Post => match self.chat(request.body.as_deref()).await {
                Ok(text) => ProxyResponse::json(200, &ChatResult::reply(text)),
                Err(e) => {
                    log_failure(&e);
                    e.into_response()
                }
            },
            RequestMethod::Other(method) => {
                warn!("Rejecting {} request", method);
                ProxyError::MethodNotAllowed.into_response()
            }
        }
    }

    /// Run one chat turn and return the trimmed reply text
    async fn chat(&self, body: Option<&str>) -> Result<String, ProxyError> {
        let chat_request = ChatRequest::from_body(body).ok_or(ProxyError::PromptRequired)?;

        let secret = self
            .config
            .token()
            .ok_or(ProxyError::MissingCredential(TOKEN_VAR))?;

        let upstream_request = UpstreamChatRequest::new(self.config.model.clone(), chat_request.prompt);

        info!(
            "[hf-router] POST {} model={} token={}",
            self.config.api_url,
            self.config.model,
            self.config.masked_token()
        );

        match self.upstream.send(&upstream_request, secret).await? {
            UpstreamReply::Success(data) => Ok(extract_reply_text(&data)),
            UpstreamReply::Failure { status, body } => Err(ProxyError::Upstream { status, body }),
        }
    }
}

/// Read `choices[0].message.content` and trim it. Any missing or mistyped
/// level yields an empty string.
pub fn extract_reply_text(data: &Value) -> String {
    data.get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .map(|content| content.trim().to_string())
        .unwrap_or_default()
}

fn log_failure(e: &ProxyError) {
    match e {
        ProxyError::MethodNotAllowed | ProxyError::PromptRequired => {
            warn!("Rejected chat request: {}", e);
        }
        ProxyError::MissingCredential(var) => {
            error!("Cannot forward chat request: {} is not set", var);
        }
        ProxyError::Upstream { status, body } => {
            error!("HF Router error: {} {}", status, body);
        }
        ProxyError::Internal(source) => {
            error!(
                name = source.name(),
                status = ?source.status(),
                "Error in chat proxy: {}",
                source
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::UpstreamError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Upstream double that replays a canned outcome and records what it saw
    struct ScriptedUpstream {
        outcome: fn() -> Result<UpstreamReply, UpstreamError>,
        calls: AtomicUsize,
        last: Mutex<Option<(UpstreamChatRequest, String)>>,
    }

    impl ScriptedUpstream {
        fn new(outcome: fn() -> Result<UpstreamReply, UpstreamError>) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                calls: AtomicUsize::new(0),
                last: Mutex::new(None),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChatUpstream for ScriptedUpstream {
        async fn send(&self, request: &UpstreamChatRequest, secret: &str) -> Result<UpstreamReply, UpstreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last.lock().unwrap() = Some((request.clone(), secret.to_string()));
            (self.outcome)()
        }
    }

    fn hello() -> Result<UpstreamReply, UpstreamError> {
        Ok(UpstreamReply::Success(json!({
            "choices": [{"message": {"role": "assistant", "content": "  Hello  "}}]
        })))
    }

    fn configured() -> ProxyConfig {
        ProxyConfig::new().with_token("hf_test1234")
    }

    fn body_json(response: &ProxyResponse) -> Value {
        serde_json::from_str(&response.body).unwrap()
    }

    fn assert_cors(response: &ProxyResponse) {
        for (name, value) in CORS_HEADERS {
            assert_eq!(response.header(name), Some(value), "missing {}", name);
        }
    }

    #[tokio::test]
    async fn test_preflight_short_circuits() {
        let upstream = ScriptedUpstream::new(hello);
        // No token configured: preflight must not care
        let proxy = RequestProxy::new(ProxyConfig::new(), upstream.clone());

        let response = proxy.handle(ProxyRequest::new("OPTIONS", Some("garbage".to_string()))).await;

        assert_eq!(response.status, 200);
        assert!(response.body.is_empty());
        assert_cors(&response);
        assert_eq!(upstream.calls(), 0);
    }

    #[tokio::test]
    async fn test_other_methods_not_allowed() {
        let upstream = ScriptedUpstream::new(hello);
        let proxy = RequestProxy::new(configured(), upstream.clone());

        for method in ["GET", "PUT", "DELETE", "PATCH", "HEAD", "post"] {
            let response = proxy.handle(ProxyRequest::new(method, None)).await;
            assert_eq!(response.status, 405, "method {}", method);
            assert_eq!(body_json(&response), json!({"error": "Method not allowed"}));
            assert_cors(&response);
        }
        assert_eq!(upstream.calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_prompts_rejected() {
        let upstream = ScriptedUpstream::new(hello);
        let proxy = RequestProxy::new(configured(), upstream.clone());

        let bodies = [
            None,
            Some("{}"),
            Some(r#"{"prompt": null}"#),
            Some(r#"{"prompt": 7}"#),
            Some(r#"{"prompt": ""}"#),
            Some("{not valid json"),
        ];

        for body in bodies {
            let response = proxy
                .handle(ProxyRequest::new(RequestMethod::Post, body.map(str::to_string)))
                .await;
            assert_eq!(response.status, 400, "body {:?}", body);
            assert_eq!(body_json(&response), json!({"error": "Prompt is required"}));
            assert_cors(&response);
        }
        assert_eq!(upstream.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_token_fails_before_forwarding() {
        let upstream = ScriptedUpstream::new(hello);
        let proxy = RequestProxy::new(ProxyConfig::new(), upstream.clone());

        let response = proxy.handle(ProxyRequest::post(r#"{"prompt": "Hi"}"#)).await;

        assert_eq!(response.status, 500);
        assert_eq!(
            body_json(&response),
            json!({"error": "Missing HF_TOKEN environment variable"})
        );
        assert_cors(&response);
        assert_eq!(upstream.calls(), 0);
    }

    #[tokio::test]
    async fn test_success_trims_reply() {
        let upstream = ScriptedUpstream::new(hello);
        let config = configured().with_model("test/model");
        let proxy = RequestProxy::new(config, upstream.clone());

        let response = proxy.handle(ProxyRequest::post(r#"{"prompt": "Say hi"}"#)).await;

        assert_eq!(response.status, 200);
        assert_eq!(body_json(&response), json!({"response": "Hello"}));
        assert_cors(&response);
        assert_eq!(upstream.calls(), 1);

        let (request, secret) = upstream.last.lock().unwrap().clone().unwrap();
        assert_eq!(secret, "hf_test1234");
        assert_eq!(request, UpstreamChatRequest::new("test/model", "Say hi"));
    }

    #[tokio::test]
    async fn test_upstream_failure_is_mirrored() {
        let upstream = ScriptedUpstream::new(|| {
            Ok(UpstreamReply::Failure {
                status: 503,
                body: "rate limited".to_string(),
            })
        });
        let proxy = RequestProxy::new(configured(), upstream);

        let response = proxy.handle(ProxyRequest::post(r#"{"prompt": "Hi"}"#)).await;

        assert_eq!(response.status, 503);
        let body = body_json(&response);
        assert_eq!(body["error"], "Upstream error from HF Router");
        assert_eq!(body["debug"]["status"], 503);
        assert_eq!(body["debug"]["body"], "rate limited");
        assert_cors(&response);
    }

    #[tokio::test]
    async fn test_upstream_failure_body_truncated() {
        let upstream = ScriptedUpstream::new(|| {
            Ok(UpstreamReply::Failure {
                status: 502,
                body: "e".repeat(5000),
            })
        });
        let proxy = RequestProxy::new(configured(), upstream);

        let response = proxy.handle(ProxyRequest::post(r#"{"prompt": "Hi"}"#)).await;

        assert_eq!(response.status, 502);
        let body = body_json(&response);
        assert_eq!(body["debug"]["body"].as_str().unwrap().len(), ERROR_BODY_LIMIT);
    }

    #[tokio::test]
    async fn test_transport_failure_is_internal_error() {
        let upstream = ScriptedUpstream::new(|| {
            Err(UpstreamError::Network {
                message: "error sending request".to_string(),
                status: None,
            })
        });
        let proxy = RequestProxy::new(configured(), upstream);

        let response = proxy.handle(ProxyRequest::post(r#"{"prompt": "Hi"}"#)).await;

        assert_eq!(response.status, 500);
        let body = body_json(&response);
        assert_eq!(body["error"], "Internal server error");
        assert_eq!(body["debug"]["name"], "NetworkError");
        assert_eq!(body["debug"]["message"], "error sending request");
        assert!(body["debug"].get("status").is_none());
        assert_cors(&response);
    }

    #[test]
    fn test_extract_reply_text_defaults() {
        assert_eq!(extract_reply_text(&json!({})), "");
        assert_eq!(extract_reply_text(&json!({"choices": []})), "");
        assert_eq!(extract_reply_text(&json!({"choices": null})), "");
        assert_eq!(extract_reply_text(&json!({"choices": [{}]})), "");
        assert_eq!(extract_reply_text(&json!({"choices": [{"message": {}}]})), "");
        assert_eq!(extract_reply_text(&json!({"choices": [{"message": {"content": null}}]})), "");
        assert_eq!(extract_reply_text(&json!({"choices": [{"message": {"content": 3}}]})), "");
        assert_eq!(extract_reply_text(&json!([1, 2])), "");
        assert_eq!(
            extract_reply_text(&json!({"choices": [{"message": {"content": "\n Hi!\t"}}, {"message": {"content": "no"}}]})),
            "Hi!"
        );
    }
}
