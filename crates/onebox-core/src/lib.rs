//! # onebox-core
//!
//! Core pipeline for the Onebox lead inbox.
//!
//! This crate provides:
//! - **Email Store** - process-lifetime, merge-on-write document store
//! - **Category Normalizer** - maps free-text model output onto a closed set
//!   of lead statuses
//! - **Pipeline** - ingest → classify → notify → index, with at-most-once
//!   notification per lead
//! - **Search Gateway** - Elasticsearch first, in-memory scan on failure
//! - **Collaborator clients** - OpenAI, Slack, generic webhook and
//!   Elasticsearch over HTTP, each behind a trait
//!
//! # Example
//!
//! ```ignore
//! use onebox_core::{Config, Onebox, SearchFilters};
//!
//! let onebox = Onebox::from_config(&Config::load().await?)?;
//! let email = onebox.pipeline.categorize_and_notify("e1", "Let's talk pricing").await?;
//! let results = onebox.search.search("pricing", &SearchFilters::default()).await;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod category;
pub mod config;
pub mod email;
mod error;
pub mod index;
pub mod llm;
pub mod notify;
pub mod pipeline;
pub mod search;
pub mod service;
pub mod tasks;

pub use category::{Category, normalize};
pub use config::Config;
pub use email::{DisplayFields, EmailDate, EmailDocument, EmailStore, IncomingEmail};
pub use error::{Error, Result};
pub use index::{ElasticsearchIndex, SearchFilters, SearchIndex, SearchResults};
pub use llm::{Assistant, Classifier, LanguageModel, OpenAiClient};
pub use notify::{
    ChatNotifier, HttpWebhook, InterestedPayload, NotificationDispatcher, SlackNotifier,
    WebhookNotifier,
};
pub use pipeline::Pipeline;
pub use search::SearchGateway;
pub use service::Onebox;
pub use tasks::BackgroundTasks;
