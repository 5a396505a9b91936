//! Dependency initialization and wiring for the catalog search binary.

use std::sync::Arc;

use tracing::info;

use super::Settings;
use crate::AppError;
use catalog_search_pipeline::{ContentSource, HttpContentSource, IndexCoordinator};
use catalog_search_repository::{OpenSearchClient, SearchEngineClient};

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The coordinator every command goes through.
    pub coordinator: IndexCoordinator,
    /// The content source, for maintenance commands that patch records.
    pub source: Arc<dyn ContentSource>,
}

impl Dependencies {
    /// Connect to the search store and the content API.
    ///
    /// Fails if the OpenSearch cluster is unreachable or unhealthy, or if
    /// the content source cannot be configured. The catalog index is created
    /// when missing.
    pub async fn new(settings: &Settings) -> Result<Self, AppError> {
        info!(
            opensearch_url = %settings.opensearch_url,
            index = %settings.index_name,
            content_api_url = %settings.content_api_url,
            environment = %settings.environment,
            "Initializing dependencies"
        );

        let search_client = OpenSearchClient::new(&settings.opensearch_url, settings.index_config())
            .await
            .map_err(|e| AppError::config(format!("Failed to create OpenSearch client: {}", e)))?;

        // Verify OpenSearch is reachable
        let healthy = search_client
            .health_check()
            .await
            .map_err(|e| AppError::config(format!("OpenSearch health check failed: {}", e)))?;

        if !healthy {
            return Err(AppError::config("OpenSearch cluster is unhealthy"));
        }

        info!("OpenSearch connection verified");

        let source: Arc<dyn ContentSource> = Arc::new(
            HttpContentSource::new(settings.source_config())
                .map_err(|e| AppError::config(format!("Failed to create content source: {}", e)))?,
        );

        let coordinator = IndexCoordinator::new(
            source.clone(),
            Arc::new(search_client),
            settings.coordinator_config(),
        );
        coordinator.ensure_index().await?;

        Ok(Self {
            coordinator,
            source,
        })
    }
}
