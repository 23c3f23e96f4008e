//! Search gateway: primary index first, in-memory scan on any failure.

use std::cmp::Reverse;
use std::sync::Arc;

use crate::email::{EmailDocument, EmailStore};
use crate::index::{MATCH_ALL, SearchFilters, SearchIndex, SearchResults};

/// Answers search requests, degrading to the [`EmailStore`] when the
/// primary index cannot.
#[derive(Clone)]
pub struct SearchGateway {
    store: Arc<EmailStore>,
    index: Arc<dyn SearchIndex>,
}

impl SearchGateway {
    /// Create a gateway over `index` with `store` as the fallback.
    #[must_use]
    pub fn new(store: Arc<EmailStore>, index: Arc<dyn SearchIndex>) -> Self {
        Self { store, index }
    }

    /// Search for `query` under `filters`.
    ///
    /// Never fails: a primary-index error is logged and the request is
    /// served from the store with the same filter semantics.
    pub async fn search(&self, query: &str, filters: &SearchFilters) -> SearchResults {
        let primary_query = if query.is_empty() { MATCH_ALL } else { query };

        match self.index.search(primary_query, filters).await {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!(error = %e, "Primary search failed, scanning in-memory store");
                self.fallback(query, filters)
            }
        }
    }

    /// Linear scan over the store, newest first.
    #[must_use]
    pub fn fallback(&self, query: &str, filters: &SearchFilters) -> SearchResults {
        let mut hits: Vec<EmailDocument> = self
            .store
            .list()
            .into_iter()
            .filter(|document| filters.matches(document, query))
            .collect();
        hits.sort_by_key(|document| {
            Reverse(document.date.as_ref().and_then(|date| date.to_datetime()))
        });

        SearchResults {
            total: u64::try_from(hits.len()).unwrap_or(u64::MAX),
            hits,
        }
    }
}

impl std::fmt::Debug for SearchGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchGateway")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::email::EmailDate;
    use crate::index::tests::ScriptedIndex;

    fn seeded_store() -> Arc<EmailStore> {
        let store = Arc::new(EmailStore::new());
        store
            .upsert(
                EmailDocument::new("e2")
                    .with_folder("work")
                    .with_subject("Hello")
                    .with_body("meeting notes"),
            )
            .unwrap();
        store
    }

    fn folder(name: &str) -> SearchFilters {
        SearchFilters {
            folder: Some(name.to_string()),
            ..SearchFilters::default()
        }
    }

    #[tokio::test]
    async fn test_primary_result_returned_verbatim() {
        let canned = SearchResults {
            total: 42,
            hits: vec![EmailDocument::new("from-index")],
        };
        let index = Arc::new(ScriptedIndex {
            results: Some(canned.clone()),
            ..ScriptedIndex::default()
        });
        let gateway = SearchGateway::new(seeded_store(), index.clone());

        assert_eq!(gateway.search("anything", &folder("work")).await, canned);
        assert_eq!(
            index.queries.lock().unwrap().as_slice(),
            [("anything".to_string(), folder("work"))]
        );
    }

    #[tokio::test]
    async fn test_empty_query_becomes_match_all() {
        let index = Arc::new(ScriptedIndex {
            results: Some(SearchResults::default()),
            ..ScriptedIndex::default()
        });
        let gateway = SearchGateway::new(seeded_store(), index.clone());

        gateway.search("", &SearchFilters::default()).await;
        assert_eq!(index.queries.lock().unwrap()[0].0, MATCH_ALL);
    }

    #[tokio::test]
    async fn test_fallback_filters_by_folder() {
        let gateway = SearchGateway::new(seeded_store(), Arc::new(ScriptedIndex::down()));

        let work = gateway.search("meeting", &folder("work")).await;
        assert_eq!(work.total, 1);
        assert_eq!(work.hits[0].id, "e2");

        let personal = gateway.search("meeting", &folder("personal")).await;
        assert_eq!(personal, SearchResults::default());
    }

    #[tokio::test]
    async fn test_fallback_empty_query_matches_all() {
        let store = seeded_store();
        store.upsert(EmailDocument::new("e3")).unwrap();
        let gateway = SearchGateway::new(store, Arc::new(ScriptedIndex::down()));

        let results = gateway.search("", &SearchFilters::default()).await;
        assert_eq!(results.total, 2);
    }

    #[tokio::test]
    async fn test_fallback_orders_newest_first() {
        let store = Arc::new(EmailStore::new());
        store
            .upsert(EmailDocument::new("old").with_date(EmailDate::Epoch(1_000)))
            .unwrap();
        store.upsert(EmailDocument::new("undated")).unwrap();
        store
            .upsert(EmailDocument::new("new").with_date(EmailDate::Epoch(2_000)))
            .unwrap();
        let gateway = SearchGateway::new(store, Arc::new(ScriptedIndex::down()));

        let ids: Vec<_> = gateway
            .fallback("", &SearchFilters::default())
            .hits
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec!["new", "old", "undated"]);
    }

    #[tokio::test]
    async fn test_fallback_agrees_with_filter_predicate() {
        let store = seeded_store();
        store
            .upsert(
                EmailDocument::new("e4")
                    .with_folder("work")
                    .with_account("a@example.com")
                    .with_body("MEETING moved"),
            )
            .unwrap();
        let gateway = SearchGateway::new(Arc::clone(&store), Arc::new(ScriptedIndex::down()));
        let filters = SearchFilters {
            folder: Some("work".into()),
            account: Some("a@example.com".into()),
        };

        let results = gateway.search("meeting", &filters).await;
        let expected = store
            .list()
            .into_iter()
            .filter(|d| filters.matches(d, "meeting"))
            .count();

        assert_eq!(results.total, 1);
        assert_eq!(results.hits.len(), expected);
        assert_eq!(results.hits[0].id, "e4");
    }
}
