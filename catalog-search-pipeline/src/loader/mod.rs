//! Loader module for the catalog search pipeline.
//!
//! Writes built documents into the search store and removes stale ones.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, info, instrument, warn};

use catalog_search_repository::{
    BatchOperationResult, BatchOperationSummary, SearchEngineClient, SearchError,
};
use catalog_search_shared::{EntityKind, IndexDocument};

/// Configuration for the search loader.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Maximum number of retry attempts for a transient write failure.
    pub max_retries: u32,
    /// Initial retry delay in milliseconds.
    pub initial_retry_delay_ms: u64,
    /// Maximum retry delay in milliseconds.
    pub max_retry_delay_ms: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_retry_delay_ms: 100,
            max_retry_delay_ms: 5000,
        }
    }
}

/// IDs stored for a kind that are not in `keep`, in store order.
pub fn stale_ids(stored: Vec<String>, keep: &HashSet<String>) -> Vec<String> {
    stored.into_iter().filter(|id| !keep.contains(id)).collect()
}

/// Loader that reconciles documents into the search store.
///
/// The loader is responsible for:
/// - Writing a batch of documents concurrently, never aborting on one failure
/// - Retrying transient store failures with exponential backoff
/// - Computing and removing the stale set of a kind
pub struct SearchLoader {
    client: Arc<dyn SearchEngineClient>,
    config: LoaderConfig,
}

impl SearchLoader {
    /// Create a new search loader with the given client.
    pub fn new(client: Arc<dyn SearchEngineClient>) -> Self {
        Self::with_config(client, LoaderConfig::default())
    }

    /// Create a new search loader with custom configuration.
    pub fn with_config(client: Arc<dyn SearchEngineClient>, config: LoaderConfig) -> Self {
        Self { client, config }
    }

    /// Write one document, retrying transient failures.
    pub async fn upsert_one(&self, document: &IndexDocument) -> Result<(), SearchError> {
        let mut delay_ms = self.config.initial_retry_delay_ms;
        let mut attempt = 0;

        loop {
            match self.client.index_document(document).await {
                Ok(()) => {
                    if attempt > 0 {
                        debug!(
                            attempt = attempt,
                            kind = %document.kind(),
                            id = %document.id(),
                            "Document index succeeded after retry"
                        );
                    }
                    return Ok(());
                }
                Err(e) if e.is_transient() && attempt < self.config.max_retries => {
                    attempt += 1;
                    debug!(
                        attempt = attempt,
                        max_retries = self.config.max_retries,
                        delay_ms = delay_ms,
                        id = %document.id(),
                        error = %e,
                        "Document index failed, retrying"
                    );

                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    delay_ms = std::cmp::min(delay_ms * 2, self.config.max_retry_delay_ms);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Write every document concurrently and report each outcome.
    #[instrument(skip(self, documents), fields(kind = %kind, count = documents.len()))]
    pub async fn upsert_all(
        &self,
        kind: EntityKind,
        documents: &[IndexDocument],
    ) -> BatchOperationSummary {
        let writes = documents.iter().map(|document| async move {
            match self.upsert_one(document).await {
                Ok(()) => BatchOperationResult::succeeded(document.kind(), document.id()),
                Err(e) => {
                    warn!(id = %document.id(), error = %e, "Failed to index document");
                    BatchOperationResult::failed(document.kind(), document.id(), e)
                }
            }
        });

        let summary = BatchOperationSummary::from_results(join_all(writes).await);
        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Upserted documents"
        );
        summary
    }

    /// Delete every stored document of `kind` whose ID is not in `keep`.
    ///
    /// Listing the stored IDs is the only step that can fail the call; the
    /// deletions themselves are reported per document.
    #[instrument(skip(self, keep), fields(kind = %kind, keep = keep.len()))]
    pub async fn delete_stale(
        &self,
        kind: EntityKind,
        keep: &HashSet<String>,
    ) -> Result<BatchOperationSummary, SearchError> {
        let stored = self.client.list_document_ids(kind).await?;
        let stale = stale_ids(stored, keep);

        if stale.is_empty() {
            debug!("No stale documents");
            return Ok(BatchOperationSummary::empty());
        }

        let deletes = stale.iter().map(|id| async move {
            match self.client.delete_document(kind, id).await {
                Ok(()) => BatchOperationResult::succeeded(kind, id.as_str()),
                Err(e) => {
                    warn!(id = %id, error = %e, "Failed to delete stale document");
                    BatchOperationResult::failed(kind, id.as_str(), e)
                }
            }
        });

        let summary = BatchOperationSummary::from_results(join_all(deletes).await);
        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Deleted stale documents"
        );
        Ok(summary)
    }

    /// Delete a single document.
    pub async fn delete_one(&self, kind: EntityKind, id: &str) -> Result<(), SearchError> {
        self.client.delete_document(kind, id).await
    }

    /// Ensure the search index exists.
    pub async fn ensure_index(&self) -> Result<(), SearchError> {
        self.client.ensure_index_exists().await
    }

    /// Check if the search engine is healthy.
    pub async fn health_check(&self) -> Result<bool, SearchError> {
        self.client.health_check().await
    }
}
