//! Settings read from the environment.

use std::env;
use std::str::FromStr;

use crate::AppError;
use catalog_search_pipeline::{CoordinatorConfig, HttpSourceConfig, LoaderConfig};
use catalog_search_repository::IndexConfig;

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default name of the catalog index.
const DEFAULT_INDEX_NAME: &str = "catalog";

/// Default content API base URL.
const DEFAULT_CONTENT_API_URL: &str = "http://localhost:8080/api";

/// Default deployment environment tag.
const DEFAULT_ENVIRONMENT: &str = "production";

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Everything the binary reads from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub opensearch_url: String,
    pub index_name: String,
    pub content_api_url: String,
    pub content_api_token: Option<String>,
    pub content_page_size: u32,
    pub environment: String,
    pub full_reindex_passes: u32,
    pub store_max_retries: u32,
    pub log_format: LogFormat,
}

impl Settings {
    /// Read settings from the process environment.
    ///
    /// # Environment Variables
    ///
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `SEARCH_INDEX_NAME`: index holding every document kind (default: catalog)
    /// - `CONTENT_API_URL`: content API base URL (default: http://localhost:8080/api)
    /// - `CONTENT_API_TOKEN`: optional bearer token for the content API
    /// - `CONTENT_PAGE_SIZE`: records per page (default: 100)
    /// - `DEPLOYMENT_ENVIRONMENT`: environment tag to index (default: production)
    /// - `FULL_REINDEX_PASSES`: passes of a full reindex (default: 1)
    /// - `STORE_MAX_RETRIES`: retries for transient store writes (default: 2)
    /// - `LOG_FORMAT`: `json` or `pretty` (default: json)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read settings through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let string = |name: &str, default: &str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let log_format = match string("LOG_FORMAT", "json").to_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" | "text" => LogFormat::Pretty,
            other => return Err(AppError::config(format!("Unknown LOG_FORMAT: {}", other))),
        };

        Ok(Self {
            opensearch_url: string("OPENSEARCH_URL", DEFAULT_OPENSEARCH_URL),
            index_name: string("SEARCH_INDEX_NAME", DEFAULT_INDEX_NAME),
            content_api_url: string("CONTENT_API_URL", DEFAULT_CONTENT_API_URL),
            content_api_token: lookup("CONTENT_API_TOKEN").filter(|t| !t.is_empty()),
            content_page_size: parse(&lookup, "CONTENT_PAGE_SIZE", 100)?,
            environment: string("DEPLOYMENT_ENVIRONMENT", DEFAULT_ENVIRONMENT),
            full_reindex_passes: parse(&lookup, "FULL_REINDEX_PASSES", 1)?,
            store_max_retries: parse(&lookup, "STORE_MAX_RETRIES", 2)?,
            log_format,
        })
    }

    pub fn index_config(&self) -> IndexConfig {
        IndexConfig::new(self.index_name.clone())
    }

    pub fn source_config(&self) -> HttpSourceConfig {
        HttpSourceConfig {
            base_url: self.content_api_url.clone(),
            token: self.content_api_token.clone(),
            page_size: self.content_page_size,
            ..HttpSourceConfig::default()
        }
    }

    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            environment: self.environment.clone(),
            full_reindex_passes: self.full_reindex_passes,
            loader: LoaderConfig {
                max_retries: self.store_max_retries,
                ..LoaderConfig::default()
            },
        }
    }
}

fn parse<F, T>(lookup: &F, name: &str, default: T) -> Result<T, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name).filter(|value| !value.trim().is_empty()) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| AppError::config(format!("Invalid {}: {}", name, value))),
    }
}
