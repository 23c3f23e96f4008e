//! Lead notifications.
//!
//! When a document first becomes [`Category::Interested`] two independent
//! channels are attempted: a chat message and a generic webhook. Either
//! channel may be unconfigured, in which case it is a no-op. Failures are
//! logged at the point they happen and never reach the caller.

mod slack;
mod webhook;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

pub use slack::SlackNotifier;
pub use webhook::HttpWebhook;

use crate::Result;
use crate::category::Category;
use crate::email::EmailDocument;

/// Payload describing a lead that turned positive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterestedPayload {
    /// Email id.
    pub id: String,
    /// Category that triggered the notification.
    pub category: Category,
    /// Subject line, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Sender, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
}

impl InterestedPayload {
    /// Build the payload for `document` under `category`.
    #[must_use]
    pub fn for_document(document: &EmailDocument, category: Category) -> Self {
        Self {
            id: document.id.clone(),
            category,
            subject: document.subject.clone(),
            from: document.from.clone(),
        }
    }

    /// Text posted to the chat channel.
    #[must_use]
    pub fn chat_text(&self) -> String {
        format!(
            "Email {} marked {}. Subject: {}",
            self.id,
            self.category,
            self.subject.as_deref().unwrap_or_default()
        )
    }
}

/// Chat channel (e.g. a Slack incoming webhook).
#[async_trait]
pub trait ChatNotifier: Send + Sync {
    /// Post `text` to the channel.
    async fn notify_chat(&self, text: &str) -> Result<()>;
}

/// Generic JSON webhook.
#[async_trait]
pub trait WebhookNotifier: Send + Sync {
    /// Deliver `payload` to the webhook.
    async fn notify_webhook(&self, payload: &InterestedPayload) -> Result<()>;
}

/// Fans an interested-lead event out to every channel, best-effort.
#[derive(Clone)]
pub struct NotificationDispatcher {
    chat: Arc<dyn ChatNotifier>,
    webhook: Arc<dyn WebhookNotifier>,
}

impl NotificationDispatcher {
    /// Create a dispatcher over the two channels.
    #[must_use]
    pub fn new(chat: Arc<dyn ChatNotifier>, webhook: Arc<dyn WebhookNotifier>) -> Self {
        Self { chat, webhook }
    }

    /// Attempt both channels; a failing channel does not stop the other.
    pub async fn notify_interested(&self, payload: &InterestedPayload) {
        if let Err(e) = self.chat.notify_chat(&payload.chat_text()).await {
            tracing::warn!(email_id = %payload.id, channel = "chat", error = %e, "Notification failed");
        }
        if let Err(e) = self.webhook.notify_webhook(payload).await {
            tracing::warn!(email_id = %payload.id, channel = "webhook", error = %e, "Notification failed");
        }
    }
}

impl std::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationDispatcher").finish_non_exhaustive()
    }
}
