//! Slack incoming-webhook notifier.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use super::ChatNotifier;
use crate::{Error, Result};

/// Posts chat messages to a Slack incoming webhook.
///
/// With no URL configured every call succeeds without doing anything.
#[derive(Debug, Clone)]
pub struct SlackNotifier {
    webhook_url: Option<String>,
    http_client: Client,
}

impl SlackNotifier {
    /// Creates a notifier for `webhook_url`.
    #[must_use]
    pub const fn new(http_client: Client, webhook_url: Option<String>) -> Self {
        Self {
            webhook_url,
            http_client,
        }
    }

    /// Whether a destination is configured.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.webhook_url.is_some()
    }
}

#[async_trait]
impl ChatNotifier for SlackNotifier {
    async fn notify_chat(&self, text: &str) -> Result<()> {
        let Some(url) = &self.webhook_url else {
            return Ok(());
        };

        let response = self
            .http_client
            .post(url)
            .json(&json!({ "text": text }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::from_response("slack", response).await);
        }

        tracing::debug!("Slack notification delivered");
        Ok(())
    }
}
