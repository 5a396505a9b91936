//! OpenSearch client implementation.
//!
//! This module provides the concrete implementation of `SearchEngineClient`
//! using the OpenSearch Rust client.

use async_trait::async_trait;
use opensearch::{
    cluster::ClusterHealthParts,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesExistsParts},
    DeleteParts, IndexParts, OpenSearch, SearchParts,
};
use serde_json::Value;
use tracing::{debug, error, info, instrument};
use url::Url;

use crate::errors::SearchError;
use crate::interfaces::SearchEngineClient;
use crate::opensearch::index_config::{get_index_settings, IndexConfig};
use crate::opensearch::queries::{build_scan_query, build_search_query};
use catalog_search_shared::{EntityKind, IndexDocument, SearchHit, SearchQuery, SearchResponse};

/// OpenSearch client implementation.
///
/// Provides document storage and full-text search using OpenSearch as the
/// backend. Every kind lives in one index; see [`IndexConfig`].
///
/// # Example
///
/// ```ignore
/// use catalog_search_repository::{IndexConfig, OpenSearchClient, SearchEngineClient};
/// let client = OpenSearchClient::new("http://localhost:9200", IndexConfig::new("catalog")).await?;
/// client.ensure_index_exists().await?;
/// let response = client.search(&SearchQuery::text("red shoes")).await?;
/// ```
pub struct OpenSearchClient {
    client: OpenSearch,
    index_config: IndexConfig,
}

impl OpenSearchClient {
    /// Create a new OpenSearch client connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    /// * `index_config` - The index name and scan settings
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchClient)` - A new client instance
    /// * `Err(SearchError)` - If connection setup fails
    pub async fn new(url: &str, index_config: IndexConfig) -> Result<Self, SearchError> {
        let parsed_url = Url::parse(url).map_err(|e| SearchError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(
            url = %url,
            alias = %index_config.alias,
            "Created OpenSearch client"
        );

        Ok(Self {
            client,
            index_config,
        })
    }

    /// Generate the store-level document ID.
    ///
    /// Uses format: `{kind}_{id}` so equal source IDs of different kinds
    /// never collide.
    fn document_id(kind: EntityKind, id: &str) -> String {
        format!("{}_{}", kind, id)
    }

    /// Parse one element of `hits.hits`.
    ///
    /// Returns `None` if the hit has no source or lacks its `type`/`id` tags.
    fn parse_hit(hit: &Value) -> Option<SearchHit> {
        let source = hit.get("_source")?;
        let kind = source.get("type")?.as_str()?.to_string();
        let id = source.get("id")?.as_str()?.to_string();

        Some(SearchHit {
            kind,
            id,
            source: source.clone(),
        })
    }

    /// Parse a full search response body.
    fn parse_search_response(body: &Value) -> Result<SearchResponse, SearchError> {
        let hits = body
            .get("hits")
            .ok_or_else(|| SearchError::parse("Response has no hits"))?;

        // `hits.total` is an object since OpenSearch 1.0 but a bare number
        // when `rest_total_hits_as_int` is set.
        let total = match hits.get("total") {
            Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
            Some(total) => total.get("value").and_then(Value::as_u64).unwrap_or(0),
            None => 0,
        };

        let hits = hits
            .get("hits")
            .and_then(Value::as_array)
            .map(|hits| hits.iter().filter_map(Self::parse_hit).collect())
            .unwrap_or_default();

        Ok(SearchResponse { total, hits })
    }

    /// Run a search request against the catalog index.
    ///
    /// Returns `Ok(None)` if the index does not exist yet.
    async fn send_search(&self, body: Value) -> Result<Option<Value>, SearchError> {
        let response = self
            .client
            .search(SearchParts::Index(&[&self.index_config.alias]))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let status = response.status_code();
        if status.as_u16() == 404 {
            debug!(alias = %self.index_config.alias, "Index not found");
            return Ok(None);
        }
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Search request failed");
            return Err(SearchError::query(format!(
                "Search failed with status {}: {}",
                status, error_body
            )));
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;
        Ok(Some(body))
    }
}

#[async_trait]
impl SearchEngineClient for OpenSearchClient {
    #[instrument(skip(self, query), fields(types = ?query.types))]
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SearchError> {
        let body = build_search_query(query);
        debug!(body = %body, "Executing search");

        match self.send_search(body).await? {
            Some(body) => Self::parse_search_response(&body),
            None => Ok(SearchResponse::empty()),
        }
    }

    /// Create or replace a document.
    async fn index_document(&self, document: &IndexDocument) -> Result<(), SearchError> {
        let doc_id = Self::document_id(document.kind(), document.id());
        let body = document.to_value()?;

        let response = self
            .client
            .index(IndexParts::IndexId(&self.index_config.alias, &doc_id))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchError::index(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Index request failed");
            return Err(SearchError::index(format!(
                "Index failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(doc_id = %doc_id, "Document indexed");
        Ok(())
    }

    /// Delete a document. A missing document is not an error.
    async fn delete_document(&self, kind: EntityKind, id: &str) -> Result<(), SearchError> {
        let doc_id = Self::document_id(kind, id);

        let response = self
            .client
            .delete(DeleteParts::IndexId(&self.index_config.alias, &doc_id))
            .send()
            .await
            .map_err(|e| SearchError::delete(e.to_string()))?;

        let status = response.status_code();

        // 404 is acceptable - document may not exist
        if !status.is_success() && status.as_u16() != 404 {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Delete request failed");
            return Err(SearchError::delete(format!(
                "Delete failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(doc_id = %doc_id, "Document deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_document_ids(&self, kind: EntityKind) -> Result<Vec<String>, SearchError> {
        let page_size = self.index_config.scan_page_size.max(1);
        let mut ids = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let body = build_scan_query(kind, page_size, after.as_deref());
            let Some(response) = self.send_search(body).await? else {
                break;
            };

            let hits = response
                .get("hits")
                .and_then(|h| h.get("hits"))
                .and_then(Value::as_array)
                .ok_or_else(|| SearchError::parse("Scan response has no hits"))?;

            let page_ids: Vec<String> = hits
                .iter()
                .filter_map(|hit| hit.get("_source")?.get("id")?.as_str().map(String::from))
                .collect();

            let page_len = hits.len();
            after = page_ids.last().cloned();
            ids.extend(page_ids);

            if page_len < page_size || after.is_none() {
                break;
            }
        }

        debug!(kind = %kind, count = ids.len(), "Listed stored document IDs");
        Ok(ids)
    }

    async fn ensure_index_exists(&self) -> Result<(), SearchError> {
        let alias = self.index_config.alias.as_str();
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[alias]))
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        if response.status_code().is_success() {
            debug!(alias = %alias, "Index already exists");
            return Ok(());
        }

        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(alias))
            .body(get_index_settings())
            .send()
            .await
            .map_err(|e| SearchError::IndexCreationError(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            // Another process may have created it in the meantime.
            if error_body.contains("resource_already_exists_exception") {
                return Ok(());
            }
            error!(status = %status, body = %error_body, "Index creation failed");
            return Err(SearchError::IndexCreationError(format!(
                "Index creation failed with status {}: {}",
                status, error_body
            )));
        }

        info!(alias = %alias, "Created search index");
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, SearchError> {
        let response = self
            .client
            .cluster()
            .health(ClusterHealthParts::None)
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let health: Value = response
            .json()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;
        let status = health
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or("unknown");

        debug!(status = %status, "OpenSearch cluster status");
        Ok(status == "green" || status == "yellow")
    }
}
