//! Elasticsearch REST client.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use url::Url;

use super::{MATCH_ALL, SearchFilters, SearchIndex, SearchResults};
use crate::email::EmailDocument;
use crate::{Error, Result};

/// Upper bound on hits returned per search.
const MAX_HITS: usize = 100;

/// Elasticsearch index of email documents.
#[derive(Debug, Clone)]
pub struct ElasticsearchIndex {
    base_url: Url,
    index: String,
    http_client: Client,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    total: Option<TotalHits>,
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TotalHits {
    Object { value: u64 },
    Count(u64),
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_source")]
    source: EmailDocument,
}

impl ElasticsearchIndex {
    /// Creates a client for `index` on the cluster at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `base_url` is not an absolute http(s) URL.
    pub fn new(http_client: Client, base_url: &str, index: impl Into<String>) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("invalid Elasticsearch URL {base_url:?}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "Elasticsearch URL {base_url} cannot be used as a base"
            )));
        }
        Ok(Self {
            base_url,
            index: index.into(),
            http_client,
        })
    }

    /// Builds `{base}/{index}/{segments...}` with every segment percent-encoded.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push(&self.index).extend(segments);
        }
        url
    }
}

/// Builds the bool query equivalent to [`SearchFilters::matches`].
fn search_body(query: &str, filters: &SearchFilters) -> Value {
    let must = if query.is_empty() || query == MATCH_ALL {
        json!({ "match_all": {} })
    } else {
        json!({
            "query_string": {
                "query": format!("*{}*", escape_query(query)),
                "fields": ["subject", "body"],
                "analyze_wildcard": true,
                "default_operator": "AND",
            }
        })
    };

    let mut filter = Vec::new();
    if let Some(folder) = &filters.folder {
        filter.push(json!({ "term": { "folder.keyword": folder } }));
    }
    if let Some(account) = &filters.account {
        filter.push(json!({ "term": { "account.keyword": account } }));
    }

    json!({
        "size": MAX_HITS,
        "query": { "bool": { "must": [must], "filter": filter } },
    })
}

/// Escapes `query_string` reserved characters so user text is matched literally.
fn escape_query(query: &str) -> String {
    const RESERVED: &str = r#"+-=&|><!(){}[]^"~*?:\/"#;

    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if RESERVED.contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl SearchResponse {
    fn into_results(self) -> SearchResults {
        let hits: Vec<EmailDocument> = self.hits.hits.into_iter().map(|h| h.source).collect();
        let total = match self.hits.total {
            Some(TotalHits::Object { value } | TotalHits::Count(value)) => value,
            None => u64::try_from(hits.len()).unwrap_or(u64::MAX),
        };
        SearchResults { total, hits }
    }
}

#[async_trait]
impl SearchIndex for ElasticsearchIndex {
    async fn index(&self, document: &EmailDocument) -> Result<()> {
        let response = self
            .http_client
            .put(self.url(&["_doc", &document.id]))
            .json(document)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::from_response("elasticsearch", response).await);
        }

        tracing::debug!(email_id = %document.id, "Indexed email");
        Ok(())
    }

    async fn search(&self, query: &str, filters: &SearchFilters) -> Result<SearchResults> {
        let response = self
            .http_client
            .post(self.url(&["_search"]))
            .json(&search_body(query, filters))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::from_response("elasticsearch", response).await);
        }

        let body: SearchResponse = response.json().await?;
        Ok(body.into_results())
    }
}
