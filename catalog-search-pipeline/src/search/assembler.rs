//! Caller-facing query service.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument};

use super::partition::{partition, single, SearchResults};
use catalog_search_repository::{SearchEngineClient, SearchError};
use catalog_search_shared::{EntityKind, SearchQuery};

/// Answers queries against the store.
///
/// A query is one store request. It is never retried and never cached.
pub struct SearchService {
    client: Arc<dyn SearchEngineClient>,
}

impl SearchService {
    pub fn new(client: Arc<dyn SearchEngineClient>) -> Self {
        Self { client }
    }

    /// Run `query` and partition the hits per type.
    #[instrument(skip(self, query), fields(term = ?query.term, offset = query.offset, limit = query.limit))]
    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResults, SearchError> {
        let response = self.client.search(query).await?;
        debug!(total = response.total, hits = response.hits.len(), "Search completed");
        Ok(partition(response.total, response.hits))
    }

    /// Fetch one document by kind and ID.
    ///
    /// Episodes get their `categoryIds` resolved into full category
    /// documents under `categories`, in ID order.
    #[instrument(skip(self))]
    pub async fn find_one(&self, kind: EntityKind, id: &str) -> Result<Option<Value>, SearchError> {
        let query = SearchQuery::for_kind(kind).with_ids([id]).with_page(0, 1);
        let response = self.client.search(&query).await?;

        let Some(mut document) = single(kind.as_str(), response.hits) else {
            return Ok(None);
        };

        if kind == EntityKind::Episode {
            let categories = self.categories(&document).await?;
            if let Value::Object(fields) = &mut document {
                fields.insert("categories".to_string(), Value::Array(categories));
            }
        }

        Ok(Some(document))
    }

    async fn categories(&self, episode: &Value) -> Result<Vec<Value>, SearchError> {
        let ids: Vec<String> = episode
            .get("categoryIds")
            .and_then(Value::as_array)
            .map(|ids| {
                ids.iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = SearchQuery::for_kind(EntityKind::Category)
            .with_ids(ids.iter().map(String::as_str))
            .with_page(0, ids.len());
        let response = self.client.search(&query).await?;

        let categories = ids
            .iter()
            .filter_map(|id| {
                response
                    .hits
                    .iter()
                    .find(|hit| &hit.id == id)
                    .map(|hit| hit.source.clone())
            })
            .collect();
        Ok(categories)
    }
}
