//! OpenAI-compatible chat completions client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::LanguageModel;
use crate::{Error, Result};

const CLASSIFY_MAX_TOKENS: u32 = 200;
const REPLY_MAX_TOKENS: u32 = 400;

/// Chat completions client.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    model: String,
    http_client: Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl ChatResponse {
    /// Trimmed content of the first choice, empty if there is none.
    fn first_content(self) -> String {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .map(|content| content.trim().to_string())
            .unwrap_or_default()
    }
}

impl OpenAiClient {
    /// Creates a new client.
    #[must_use]
    pub fn new(
        http_client: Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            http_client,
        }
    }

    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens,
        };

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::from_response("openai", response).await);
        }

        let body: ChatResponse = response.json().await?;
        Ok(body.first_content())
    }
}

fn classification_prompt(text: &str) -> String {
    format!(
        "Classify the following email into one of: Interested, Meeting Booked, \
         Not Interested, Spam, Out of Office.\n\nEmail:\n{text}"
    )
}

fn reply_prompt(email_body: &str, context: &[String]) -> String {
    format!(
        "You are an assistant. Context: {}\n\nEmail: {email_body}\n\nWrite a concise reply.",
        context.join("\n")
    )
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    async fn classify(&self, text: &str) -> Result<String> {
        self.complete(&classification_prompt(text), CLASSIFY_MAX_TOKENS)
            .await
    }

    async fn suggest_reply(&self, email_body: &str, context: &[String]) -> Result<String> {
        self.complete(&reply_prompt(email_body, context), REPLY_MAX_TOKENS)
            .await
    }
}
