//! Service configuration.
//!
//! Values are layered: built-in defaults, then
//! `<config_dir>/onebox/settings.json` if it exists, then environment
//! variables. Empty environment values are ignored.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, Result};

/// Default context handed to the reply assistant.
pub const DEFAULT_REPLY_CONTEXT: &str =
    "If the lead is interested, share the meeting booking link: https://cal.com/example";

/// Runtime configuration for the Onebox service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP listen port.
    pub port: u16,
    /// Language model API key; classification is disabled without it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,
    /// Chat completions API base URL.
    pub openai_base_url: String,
    /// Chat completions model name.
    pub openai_model: String,
    /// Slack incoming webhook; the chat channel is a no-op without it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slack_webhook_url: Option<String>,
    /// Generic webhook; the webhook channel is a no-op without it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    /// Elasticsearch base URL.
    pub elasticsearch_url: String,
    /// Elasticsearch index name.
    pub elasticsearch_index: String,
    /// Timeout applied to every outbound HTTP call.
    pub http_timeout_secs: u64,
    /// Reference documents for reply suggestions.
    pub reply_context: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5000,
            openai_api_key: None,
            openai_base_url: "https://api.openai.com/v1".to_string(),
            openai_model: "gpt-4o-mini".to_string(),
            slack_webhook_url: None,
            webhook_url: None,
            elasticsearch_url: "http://localhost:9200".to_string(),
            elasticsearch_index: "emails".to_string(),
            http_timeout_secs: 10,
            reply_context: vec![DEFAULT_REPLY_CONTEXT.to_string()],
        }
    }
}

impl Config {
    /// Default settings file location.
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("onebox")
            .join("settings.json")
    }

    /// Load from the default settings file and the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file exists but cannot be read or
    /// parsed, or if any value is invalid.
    pub async fn load() -> Result<Self> {
        Self::load_from(&Self::default_path(), |key| std::env::var(key).ok()).await
    }

    /// Load from `path` (if present), then apply overrides from `env`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if any value
    /// is invalid.
    pub async fn load_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = if tokio::fs::try_exists(path).await? {
            let contents = tokio::fs::read_to_string(path).await?;
            let config: Self = serde_json::from_str(&contents)?;
            tracing::debug!("Loaded settings from {:?}", path);
            config
        } else {
            Self::default()
        };

        config.apply_env(env)?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields from environment-style lookups.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a numeric value does not parse.
    pub fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) -> Result<()> {
        let var = |key: &str| env(key).filter(|value| !value.trim().is_empty());

        if let Some(port) = var("PORT") {
            self.port = parse_number("PORT", &port)?;
        }
        if let Some(timeout) = var("HTTP_TIMEOUT_SECS") {
            self.http_timeout_secs = parse_number("HTTP_TIMEOUT_SECS", &timeout)?;
        }
        if let Some(key) = var("OPENAI_API_KEY") {
            self.openai_api_key = Some(key);
        }
        if let Some(url) = var("OPENAI_BASE_URL") {
            self.openai_base_url = url;
        }
        if let Some(model) = var("OPENAI_MODEL") {
            self.openai_model = model;
        }
        if let Some(url) = var("SLACK_WEBHOOK_URL") {
            self.slack_webhook_url = Some(url);
        }
        if let Some(url) = var("WEBHOOK_URL") {
            self.webhook_url = Some(url);
        }
        if let Some(url) = var("ELASTICSEARCH_URL") {
            self.elasticsearch_url = url;
        }
        if let Some(index) = var("ELASTICSEARCH_INDEX") {
            self.elasticsearch_index = index;
        }
        Ok(())
    }

    /// Check every URL-valued field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        validate_url("openai_base_url", &self.openai_base_url)?;
        validate_url("elasticsearch_url", &self.elasticsearch_url)?;
        if let Some(url) = &self.slack_webhook_url {
            validate_url("slack_webhook_url", url)?;
        }
        if let Some(url) = &self.webhook_url {
            validate_url("webhook_url", url)?;
        }
        if self.elasticsearch_index.trim().is_empty() {
            return Err(Error::Config("elasticsearch_index must not be empty".into()));
        }
        Ok(())
    }

    /// Outbound HTTP timeout.
    #[must_use]
    pub const fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{key} must be a number, got {value:?}")))
}

fn validate_url(field: &str, value: &str) -> Result<()> {
    let url = Url::parse(value).map_err(|e| Error::Config(format!("{field}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(Error::Config(format!(
            "{field}: unsupported scheme {other:?}"
        ))),
    }
}
