//! # Catalog Search Repository
//!
//! This crate provides the trait and implementation for talking to the
//! search store. It includes the error type, the batch result types, and a
//! concrete implementation for OpenSearch.

pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod types;

pub use errors::SearchError;
pub use interfaces::SearchEngineClient;
pub use opensearch::{IndexConfig, OpenSearchClient};
pub use types::{BatchOperationResult, BatchOperationSummary};
