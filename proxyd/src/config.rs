//! Configuration management for the proxy server

use crate::cli::Cli;
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use personachat_core::ProxyConfig;
use personachat_http::ServerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

/// Config files picked up from the working directory, first match wins
const DEFAULT_CONFIG_PATHS: [&str; 4] = [
    "personachat.yaml",
    "personachat.yml",
    ".personachat.yaml",
    ".personachat.yml",
];

/// Errors raised while resolving configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    Extract(#[from] figment::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Full configuration of the server process
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Upstream settings, overridable with `HF_API_URL`, `HF_TOKEN`, `HF_MODEL`
    pub proxy: ProxyConfig,
    /// HTTP settings, overridable with `PERSONACHAT_*`
    pub server: ServerConfig,
}

impl AppConfig {
    /// Layered sources: defaults, YAML file, then environment
    pub fn figment(config_path: Option<&Path>) -> Result<Figment, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

        for path in &DEFAULT_CONFIG_PATHS {
            if Path::new(path).exists() {
                figment = figment.merge(Yaml::file(path));
                break;
            }
        }

        if let Some(path) = config_path {
            if path.exists() {
                figment = figment.merge(Yaml::file(path));
            } else {
                return Err(ConfigError::FileNotFound(path.display().to_string()));
            }
        }

        figment = figment
            .merge(
                Env::prefixed("HF_")
                    .only(&["api_url", "token", "model"])
                    .map(|key| format!("proxy.{}", key).into()),
            )
            .merge(Env::prefixed("PERSONACHAT_").map(|key| format!("server.{}", key).into()));

        Ok(figment)
    }

    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = Self::figment(config_path)?.extract()?;
        Ok(config)
    }

    /// Apply CLI argument overrides to the configuration
    pub fn with_overrides(mut self, args: &Cli) -> Self {
        if let Some(bind) = args.bind {
            self.server.bind_address = bind;
        }

        if let Some(ref path) = args.path {
            self.server.proxy_path = path.clone();
        }

        if let Some(ref model) = args.model {
            self.proxy.model = model.clone();
        }

        self
    }

    /// Reject values the router or connector cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.server.proxy_path.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "proxy_path must start with '/': {}",
                self.server.proxy_path
            )));
        }

        if self.server.proxy_path == "/health" {
            return Err(ConfigError::Invalid("proxy_path collides with the health check route".to_string()));
        }

        if self.server.proxy_path.contains([':', '*', '{']) {
            return Err(ConfigError::Invalid(format!(
                "proxy_path must be a literal path without ':', '*' or '{{': {}",
                self.server.proxy_path
            )));
        }

        if self.proxy.api_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api_url must not be empty".to_string()));
        }

        if self.proxy.model.trim().is_empty() {
            return Err(ConfigError::Invalid("model must not be empty".to_string()));
        }

        Ok(())
    }

    /// Human readable summary with the secret masked
    pub fn summary(&self) -> String {
        format!(
            "api_url: {}\nmodel: {}\ntoken: {}\nbind_address: {}\nproxy_path: {}\nnetlify_alias: {}",
            self.proxy.api_url,
            self.proxy.model,
            self.proxy.masked_token(),
            self.server.bind_address,
            self.server.proxy_path,
            self.server.netlify_alias
        )
    }

    /// Log the resolved configuration without exposing the secret
    pub fn log_summary(&self) {
        info!(
            api_url = %self.proxy.api_url,
            model = %self.proxy.model,
            token = %self.proxy.masked_token(),
            bind_address = %self.server.bind_address,
            proxy_path = %self.server.proxy_path,
            "Resolved configuration"
        );

        if self.proxy.token().is_none() {
            warn!("HF_TOKEN is not set; chat requests will be answered with 500");
        }
    }
}
