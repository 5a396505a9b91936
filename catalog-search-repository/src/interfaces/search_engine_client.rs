//! Search engine client trait definition.
//!
//! This module defines the abstract interface for search store operations,
//! allowing for different backend implementations (OpenSearch, in-memory
//! mocks, etc.).

use async_trait::async_trait;

use crate::errors::SearchError;
use catalog_search_shared::{EntityKind, IndexDocument, SearchQuery, SearchResponse};

/// Abstract interface for search store operations.
///
/// Documents are stored per kind and keyed by their source `id`, so the same
/// ID may exist once for each kind.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` to allow use across async tasks.
///
/// # Error Handling
///
/// All methods return `Result<T, SearchError>` for consistent error handling.
#[async_trait]
pub trait SearchEngineClient: Send + Sync {
    /// Execute a search query.
    ///
    /// # Arguments
    ///
    /// * `query` - Text, filters, type restriction and pagination
    ///
    /// # Returns
    ///
    /// * `Ok(SearchResponse)` - The total match count and the requested page of hits
    /// * `Err(SearchError)` - If the search fails
    ///
    /// # Example
    ///
    /// ```ignore
    /// let query = SearchQuery::text("red shoes").with_page(0, 20);
    /// let response = client.search(&query).await?;
    /// println!("Found {} results", response.total);
    /// ```
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SearchError>;

    /// Create or replace a document, keyed by its kind and `id`.
    async fn index_document(&self, document: &IndexDocument) -> Result<(), SearchError>;

    /// Delete a document.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the document was deleted (or didn't exist)
    /// * `Err(SearchError)` - If the deletion fails
    async fn delete_document(&self, kind: EntityKind, id: &str) -> Result<(), SearchError>;

    /// List the IDs of every stored document of `kind`.
    ///
    /// Used to compute the stale set after a full reindex of that kind.
    async fn list_document_ids(&self, kind: EntityKind) -> Result<Vec<String>, SearchError>;

    /// Ensure the search index exists with proper mappings.
    ///
    /// This should be called during application startup.
    async fn ensure_index_exists(&self) -> Result<(), SearchError>;

    /// Check if the search engine is healthy and reachable.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - If the search engine is healthy
    /// * `Ok(false)` - If the search engine is unhealthy
    /// * `Err(SearchError)` - If the health check fails to execute
    async fn health_check(&self) -> Result<bool, SearchError>;
}
