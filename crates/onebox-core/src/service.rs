//! Wiring of the core components from a [`Config`].

use std::sync::Arc;

use reqwest::Client;

use crate::config::Config;
use crate::email::EmailStore;
use crate::index::{ElasticsearchIndex, SearchIndex};
use crate::llm::{Assistant, Classifier, LanguageModel, OpenAiClient};
use crate::notify::{HttpWebhook, NotificationDispatcher, SlackNotifier};
use crate::pipeline::Pipeline;
use crate::search::SearchGateway;
use crate::tasks::BackgroundTasks;
use crate::{Error, Result};

/// Every long-lived component of the service, sharing one store.
#[derive(Debug, Clone)]
pub struct Onebox {
    /// Ingestion and categorization.
    pub pipeline: Pipeline,
    /// Primary-then-fallback search.
    pub search: SearchGateway,
    /// Reply suggestions.
    pub assistant: Assistant,
    /// Detached side effects spawned by the pipeline.
    pub background: Arc<BackgroundTasks>,
}

impl Onebox {
    /// Build the HTTP-backed collaborators described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or a URL is
    /// invalid.
    pub fn from_config(config: &Config) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.http_timeout())
            .user_agent(concat!("onebox/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::Http)?;

        let model: Option<Arc<dyn LanguageModel>> = config.openai_api_key.as_ref().map(|key| {
            Arc::new(OpenAiClient::new(
                http_client.clone(),
                config.openai_base_url.as_str(),
                key.as_str(),
                config.openai_model.as_str(),
            )) as Arc<dyn LanguageModel>
        });
        if model.is_none() {
            tracing::warn!("OPENAI_API_KEY not set, every email will be categorized Unknown");
        }

        let slack = SlackNotifier::new(http_client.clone(), config.slack_webhook_url.clone());
        let webhook = HttpWebhook::new(http_client.clone(), config.webhook_url.clone());
        tracing::info!(
            slack = slack.is_configured(),
            webhook = webhook.is_configured(),
            "Notification channels configured"
        );

        let index = ElasticsearchIndex::new(
            http_client,
            &config.elasticsearch_url,
            config.elasticsearch_index.as_str(),
        )?;

        Ok(Self::assemble(
            Classifier::new(model.clone()),
            Assistant::new(model, config.reply_context.clone()),
            NotificationDispatcher::new(Arc::new(slack), Arc::new(webhook)),
            Arc::new(index),
        ))
    }

    /// Assemble the components around a fresh store.
    #[must_use]
    pub fn assemble(
        classifier: Classifier,
        assistant: Assistant,
        dispatcher: NotificationDispatcher,
        index: Arc<dyn SearchIndex>,
    ) -> Self {
        let store = Arc::new(EmailStore::new());
        let background = Arc::new(BackgroundTasks::new());
        let pipeline = Pipeline::new(
            Arc::clone(&store),
            classifier,
            dispatcher,
            Arc::clone(&index),
            Arc::clone(&background),
        );
        Self {
            pipeline,
            search: SearchGateway::new(store, index),
            assistant,
            background,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::email::EmailDocument;
    use crate::index::SearchFilters;

    #[tokio::test]
    async fn test_from_default_config() {
        let onebox = Onebox::from_config(&Config::default()).unwrap();
        assert_eq!(
            onebox.assistant.suggest_reply("hi").await.unwrap(),
            crate::llm::NO_MODEL_REPLY
        );
    }

    #[tokio::test]
    async fn test_search_and_pipeline_share_store() {
        let onebox = Onebox::from_config(&Config {
            // nothing listens here, so search falls back to the store
            elasticsearch_url: "http://127.0.0.1:9".into(),
            ..Config::default()
        })
        .unwrap();

        onebox
            .pipeline
            .store()
            .upsert(EmailDocument::new("e1").with_subject("Quarterly meeting"))
            .unwrap();

        let results = onebox.search.search("meeting", &SearchFilters::default()).await;
        assert_eq!(results.total, 1);
        assert_eq!(results.hits[0].id, "e1");
    }
}
