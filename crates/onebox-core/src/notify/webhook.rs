//! Generic JSON webhook notifier.

use async_trait::async_trait;
use reqwest::Client;

use super::{InterestedPayload, WebhookNotifier};
use crate::{Error, Result};

/// Posts the interested-lead payload to an arbitrary URL.
///
/// With no URL configured every call succeeds without doing anything.
#[derive(Debug, Clone)]
pub struct HttpWebhook {
    url: Option<String>,
    http_client: Client,
}

impl HttpWebhook {
    /// Creates a webhook notifier for `url`.
    #[must_use]
    pub const fn new(http_client: Client, url: Option<String>) -> Self {
        Self { url, http_client }
    }

    /// Whether a destination is configured.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.url.is_some()
    }
}

#[async_trait]
impl WebhookNotifier for HttpWebhook {
    async fn notify_webhook(&self, payload: &InterestedPayload) -> Result<()> {
        let Some(url) = &self.url else {
            return Ok(());
        };

        let response = self.http_client.post(url).json(payload).send().await?;

        if !response.status().is_success() {
            return Err(Error::from_response("webhook", response).await);
        }

        tracing::debug!(email_id = %payload.id, "Webhook delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;
    use crate::email::EmailDocument;

    #[tokio::test]
    async fn test_unconfigured_is_noop() {
        let webhook = HttpWebhook::new(Client::new(), None);
        let payload =
            InterestedPayload::for_document(&EmailDocument::new("e1"), Category::Interested);
        assert!(!webhook.is_configured());
        assert!(webhook.notify_webhook(&payload).await.is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_collaborator_failure() {
        // Port 9 (discard) on localhost is closed in test environments.
        let webhook = HttpWebhook::new(Client::new(), Some("http://127.0.0.1:9/hook".into()));
        let payload =
            InterestedPayload::for_document(&EmailDocument::new("e1"), Category::Interested);
        let err = webhook.notify_webhook(&payload).await.unwrap_err();
        assert!(err.is_collaborator_failure());
    }
}
