//! Coordinator module for the catalog search pipeline.
//!
//! Routes index requests to the indexer of the requested kind, or runs the
//! full ordered sequence for a reindex of everything.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument};

use crate::errors::PipelineError;
use crate::indexers::EntityIndexer;
use crate::loader::{LoaderConfig, SearchLoader};
use crate::report::{IndexReport, ReindexReport};
use crate::search::{SearchResults, SearchService};
use crate::source::ContentSource;
use catalog_search_repository::SearchEngineClient;
use catalog_search_shared::{EntityKind, IndexDocument, SearchQuery};

/// Kinds reindexed by a full run, in order.
///
/// Carousels and affiliates are only indexed when asked for by name.
pub const FULL_REINDEX_ORDER: [EntityKind; 7] = [
    EntityKind::Offer,
    EntityKind::Brand,
    EntityKind::Charity,
    EntityKind::Episode,
    EntityKind::Star,
    EntityKind::Category,
    EntityKind::Series,
];

/// What an index request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexTarget {
    All,
    Kind(EntityKind),
}

impl FromStr for IndexTarget {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(IndexTarget::All);
        }
        s.parse::<EntityKind>()
            .map(IndexTarget::Kind)
            .map_err(|_| PipelineError::invalid_index_type(s))
    }
}

impl fmt::Display for IndexTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexTarget::All => f.write_str("all"),
            IndexTarget::Kind(kind) => write!(f, "{}", kind),
        }
    }
}

/// Configuration for the coordinator.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Environment tag records must carry to be indexed.
    pub environment: String,
    /// Number of times a full reindex runs the whole sequence.
    pub full_reindex_passes: u32,
    /// Retry settings for store writes.
    pub loader: LoaderConfig,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            environment: "production".to_string(),
            full_reindex_passes: 1,
            loader: LoaderConfig::default(),
        }
    }
}

/// Result of [`IndexCoordinator::index_data`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "report", rename_all = "snake_case")]
pub enum IndexOutcome {
    /// A full reindex ran.
    Reindexed(ReindexReport),
    /// Every record of one kind was indexed.
    Indexed(IndexReport),
    /// One record was indexed, or produced no document.
    Document(Option<IndexDocument>),
}

/// Public entry point of the pipeline.
///
/// Holds the content source and the store explicitly; every indexer it runs
/// shares them.
pub struct IndexCoordinator {
    source: Arc<dyn ContentSource>,
    loader: Arc<SearchLoader>,
    search: SearchService,
    config: CoordinatorConfig,
}

impl IndexCoordinator {
    pub fn new(
        source: Arc<dyn ContentSource>,
        client: Arc<dyn SearchEngineClient>,
        config: CoordinatorConfig,
    ) -> Self {
        let loader = Arc::new(SearchLoader::with_config(client.clone(), config.loader.clone()));
        Self {
            source,
            loader,
            search: SearchService::new(client),
            config,
        }
    }

    fn indexer(&self, kind: EntityKind) -> EntityIndexer {
        EntityIndexer::new(
            kind,
            self.source.clone(),
            self.loader.clone(),
            self.config.environment.clone(),
        )
    }

    /// Dispatch a request by type name: `all` runs a full reindex, any other
    /// kind indexes one record when `id` is given and the whole kind
    /// otherwise.
    #[instrument(skip(self))]
    pub async fn index_data(
        &self,
        target: &str,
        id: Option<&str>,
    ) -> Result<IndexOutcome, PipelineError> {
        match (target.parse::<IndexTarget>()?, id) {
            (IndexTarget::All, _) => Ok(IndexOutcome::Reindexed(self.index_all().await?)),
            (IndexTarget::Kind(kind), None) => Ok(IndexOutcome::Indexed(self.index_kind(kind).await?)),
            (IndexTarget::Kind(kind), Some(id)) => {
                Ok(IndexOutcome::Document(self.index_one(kind, id).await?))
            }
        }
    }

    /// Run every kind of [`FULL_REINDEX_ORDER`], strictly one after the other,
    /// for the configured number of passes.
    #[instrument(skip(self), fields(passes = self.config.full_reindex_passes))]
    pub async fn index_all(&self) -> Result<ReindexReport, PipelineError> {
        let mut report = ReindexReport::default();

        for pass in 1..=self.config.full_reindex_passes.max(1) {
            info!(pass = pass, "Starting full reindex pass");
            let mut reports = Vec::with_capacity(FULL_REINDEX_ORDER.len());
            for kind in FULL_REINDEX_ORDER {
                reports.push(self.index_kind(kind).await?);
            }
            report.passes.push(reports);
        }

        info!(clean = report.is_clean(), "Full reindex finished");
        Ok(report)
    }

    pub async fn index_kind(&self, kind: EntityKind) -> Result<IndexReport, PipelineError> {
        self.indexer(kind).index_all().await
    }

    pub async fn index_one(
        &self,
        kind: EntityKind,
        id: &str,
    ) -> Result<Option<IndexDocument>, PipelineError> {
        self.indexer(kind).index_by_id(id).await
    }

    pub async fn delete_one(&self, kind: EntityKind, id: &str) -> Result<(), PipelineError> {
        self.indexer(kind).delete_by_id(id).await
    }

    /// Run a query and partition the hits per type.
    pub async fn query(&self, query: &SearchQuery) -> Result<SearchResults, PipelineError> {
        Ok(self.search.search(query).await?)
    }

    /// Look up one indexed document with its lookup-time relations attached.
    pub async fn find_one(&self, kind: EntityKind, id: &str) -> Result<Option<Value>, PipelineError> {
        Ok(self.search.find_one(kind, id).await?)
    }

    /// Ensure the search index exists.
    pub async fn ensure_index(&self) -> Result<(), PipelineError> {
        Ok(self.loader.ensure_index().await?)
    }

    /// Check if the search store is healthy.
    pub async fn health_check(&self) -> Result<bool, PipelineError> {
        Ok(self.loader.health_check().await?)
    }
}
