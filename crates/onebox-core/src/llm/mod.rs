//! Language model collaborator and the adapters the pipeline talks to.
//!
//! The model is consumed two ways:
//! - [`Classifier`] never fails: any error becomes the literal `"Unknown"`
//! - [`Assistant`] drafts replies and does surface model failures

mod openai;

use std::sync::Arc;

use async_trait::async_trait;

pub use openai::OpenAiClient;

use crate::Result;

/// Label returned when classification cannot run.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Reply returned when no model is configured.
pub const NO_MODEL_REPLY: &str = "No API key configured.";

/// External language model.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Classify `text` into a raw, unnormalized label.
    async fn classify(&self, text: &str) -> Result<String>;

    /// Draft a reply to `email_body` using `context` as reference material.
    async fn suggest_reply(&self, email_body: &str, context: &[String]) -> Result<String>;
}

/// Availability-first wrapper around an optional [`LanguageModel`].
#[derive(Clone, Default)]
pub struct Classifier {
    model: Option<Arc<dyn LanguageModel>>,
}

impl Classifier {
    /// Wrap a model; `None` means classification is unavailable.
    #[must_use]
    pub fn new(model: Option<Arc<dyn LanguageModel>>) -> Self {
        Self { model }
    }

    /// Raw label for `text`, or [`UNKNOWN_LABEL`] when the model is missing
    /// or fails.
    pub async fn classify(&self, text: &str) -> String {
        let Some(model) = &self.model else {
            tracing::debug!("No language model configured, skipping classification");
            return UNKNOWN_LABEL.to_string();
        };

        match model.classify(text).await {
            Ok(label) => label,
            Err(e) => {
                tracing::warn!(error = %e, "Classification failed, falling back to Unknown");
                UNKNOWN_LABEL.to_string()
            }
        }
    }
}

impl std::fmt::Debug for Classifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Classifier")
            .field("configured", &self.model.is_some())
            .finish()
    }
}

/// Drafts replies grounded on a fixed set of context documents.
#[derive(Clone)]
pub struct Assistant {
    model: Option<Arc<dyn LanguageModel>>,
    context: Arc<[String]>,
}

impl Assistant {
    /// Create an assistant with the given context documents.
    #[must_use]
    pub fn new(model: Option<Arc<dyn LanguageModel>>, context: Vec<String>) -> Self {
        Self {
            model,
            context: context.into(),
        }
    }

    /// Suggest a reply to `email_body`.
    ///
    /// Returns [`NO_MODEL_REPLY`] when no model is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the model call fails.
    pub async fn suggest_reply(&self, email_body: &str) -> Result<String> {
        match &self.model {
            Some(model) => model.suggest_reply(email_body, &self.context).await,
            None => Ok(NO_MODEL_REPLY.to_string()),
        }
    }
}

impl std::fmt::Debug for Assistant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assistant")
            .field("configured", &self.model.is_some())
            .field("context_docs", &self.context.len())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use crate::Error;
    use std::sync::Mutex;

    /// Scripted model that records what it was asked.
    #[derive(Default)]
    pub struct ScriptedModel {
        pub label: Option<String>,
        pub reply: Option<String>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        pub fn labelling(label: &str) -> Self {
            Self {
                label: Some(label.to_string()),
                ..Self::default()
            }
        }

        pub fn failing() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        async fn classify(&self, text: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(text.to_string());
            self.label
                .clone()
                .ok_or_else(|| Error::Unavailable("scripted model".into()))
        }

        async fn suggest_reply(&self, email_body: &str, context: &[String]) -> Result<String> {
            self.prompts
                .lock()
                .unwrap()
                .push(format!("{}|{email_body}", context.join(",")));
            self.reply
                .clone()
                .ok_or_else(|| Error::Unavailable("scripted model".into()))
        }
    }

    #[tokio::test]
    async fn test_classifier_passes_label_through() {
        let classifier = Classifier::new(Some(Arc::new(ScriptedModel::labelling("Spam"))));
        assert_eq!(classifier.classify("buy now").await, "Spam");
    }

    #[tokio::test]
    async fn test_classifier_without_model_is_unknown() {
        let classifier = Classifier::default();
        assert_eq!(classifier.classify("hello").await, UNKNOWN_LABEL);
    }

    #[tokio::test]
    async fn test_classifier_swallows_errors() {
        let classifier = Classifier::new(Some(Arc::new(ScriptedModel::failing())));
        assert_eq!(classifier.classify("hello").await, UNKNOWN_LABEL);
    }

    #[tokio::test]
    async fn test_assistant_without_model() {
        let assistant = Assistant::new(None, vec!["ctx".into()]);
        assert_eq!(
            assistant.suggest_reply("hi").await.unwrap(),
            NO_MODEL_REPLY
        );
    }

    #[tokio::test]
    async fn test_assistant_forwards_context() {
        let model = Arc::new(ScriptedModel {
            reply: Some("Sure, book here".into()),
            ..ScriptedModel::default()
        });
        let assistant = Assistant::new(Some(model.clone()), vec!["link".into()]);

        assert_eq!(
            assistant.suggest_reply("Can we talk?").await.unwrap(),
            "Sure, book here"
        );
        assert_eq!(
            model.prompts.lock().unwrap().as_slice(),
            ["link|Can we talk?"]
        );
    }

    #[tokio::test]
    async fn test_assistant_surfaces_errors() {
        let assistant = Assistant::new(Some(Arc::new(ScriptedModel::failing())), Vec::new());
        assert!(assistant.suggest_reply("hi").await.is_err());
    }
}
