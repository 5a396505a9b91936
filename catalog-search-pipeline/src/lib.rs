//! # Catalog Search Pipeline
//!
//! This crate aggregates catalog data from the content source, denormalizes
//! cross-entity relations in memory, and reconciles the result into the
//! search store. It also answers queries against the store.
//!
//! ## Architecture
//!
//! Indexing follows the Source-Indexer-Loader pattern:
//!
//! 1. **Source**: Fetches paginated entity collections from the content API
//! 2. **Entity maps**: Key auxiliary collections by ID for joins
//! 3. **Indexers**: Build one denormalized document per source record
//! 4. **Loader**: Upserts documents and deletes stale ones from the store
//! 5. **Coordinator**: Routes requests to the right indexer, or runs them all
//!
//! Queries go through the **search** module, which builds the store query
//! and partitions hits per entity type.

pub mod coordinator;
pub mod entity_map;
pub mod errors;
pub mod indexers;
pub mod loader;
pub mod report;
pub mod search;
pub mod source;

#[cfg(test)]
pub(crate) mod testing;

pub use coordinator::{
    CoordinatorConfig, IndexCoordinator, IndexOutcome, IndexTarget, FULL_REINDEX_ORDER,
};
pub use entity_map::{build_map, EntityMap, JoinContext};
pub use errors::{PipelineError, SourceError};
pub use indexers::{builder_for, DocumentBuilder, EntityIndexer};
pub use loader::{LoaderConfig, SearchLoader};
pub use report::{IndexReport, ReindexReport, SkipReason, SkippedRecord};
pub use search::{SearchResults, SearchService};
pub use source::{
    ContentSource, EnvironmentScope, HttpContentSource, HttpSourceConfig, RecordBatch,
};
