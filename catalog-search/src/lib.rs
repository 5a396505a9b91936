//! # Catalog Search
//!
//! Entry point and configuration for running the catalog search pipeline
//! from the command line.

pub mod config;
pub mod maintenance;

pub use config::{Dependencies, LogFormat, Settings};

use catalog_search_pipeline::{PipelineError, SourceError};
use catalog_search_repository::SearchError;
use thiserror::Error;

/// Errors that can occur during initialization or while running a command.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    PipelineError(#[from] PipelineError),

    /// Search error.
    #[error("Search error: {0}")]
    SearchError(#[from] SearchError),

    /// Content source error.
    #[error("Source error: {0}")]
    SourceError(#[from] SourceError),

    /// A requested record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Output could not be serialized.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}
