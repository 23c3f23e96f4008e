//! Primary full-text index collaborator.

mod elasticsearch;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use elasticsearch::ElasticsearchIndex;

use crate::Result;
use crate::email::EmailDocument;

/// Query token that matches every document.
pub const MATCH_ALL: &str = "*";

/// Optional provenance filters applied to a search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilters {
    /// Exact folder match.
    #[serde(default)]
    pub folder: Option<String>,
    /// Exact account match.
    #[serde(default)]
    pub account: Option<String>,
}

impl SearchFilters {
    /// Whether `document` passes the folder and account filters and
    /// contains `query` (case-insensitive) in its subject or body.
    ///
    /// An empty query or [`MATCH_ALL`] matches everything.
    #[must_use]
    pub fn matches(&self, document: &EmailDocument, query: &str) -> bool {
        if let Some(folder) = &self.folder
            && document.folder.as_ref() != Some(folder)
        {
            return false;
        }
        if let Some(account) = &self.account
            && document.account.as_ref() != Some(account)
        {
            return false;
        }
        if query.is_empty() || query == MATCH_ALL {
            return true;
        }
        document
            .search_text()
            .to_lowercase()
            .contains(&query.to_lowercase())
    }
}

/// Search response shared by the index and the in-memory fallback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResults {
    /// Number of matching documents.
    pub total: u64,
    /// Matching documents.
    pub hits: Vec<EmailDocument>,
}

/// Full-text index holding a copy of every document.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Store or replace `document` in the index.
    async fn index(&self, document: &EmailDocument) -> Result<()>;

    /// Search for `query` under `filters`. `query` is never empty; callers
    /// pass [`MATCH_ALL`] instead.
    async fn search(&self, query: &str, filters: &SearchFilters) -> Result<SearchResults>;
}
