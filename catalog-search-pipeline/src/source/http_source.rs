//! HTTP implementation of the content source.
//!
//! The content API serves one collection per kind:
//!
//! - `GET {base}/{collection}?page={n}&limit={size}` returns a bare JSON array
//!   or an object wrapping it under `items`
//! - `GET {base}/{collection}/{id}` returns one record, 404 when unknown
//! - `PATCH {base}/{collection}/{id}` applies a partial update

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

use super::{ContentSource, RecordBatch};
use crate::errors::SourceError;
use catalog_search_shared::{SourceKind, SourceRecord};

/// Configuration for the HTTP content source.
#[derive(Debug, Clone)]
pub struct HttpSourceConfig {
    /// Base URL of the content API, e.g. `http://localhost:8080/api`.
    pub base_url: String,
    /// Optional bearer token sent with every request.
    pub token: Option<String>,
    /// Records requested per page.
    pub page_size: u32,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for HttpSourceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            token: None,
            page_size: 100,
            timeout_secs: 30,
        }
    }
}

/// Content source backed by the catalog's REST API.
pub struct HttpContentSource {
    client: Client,
    base_url: Url,
    token: Option<String>,
    page_size: u32,
}

impl HttpContentSource {
    /// Create a new source from its configuration.
    ///
    /// Fails if the base URL does not parse or the HTTP client cannot be
    /// built.
    pub fn new(config: HttpSourceConfig) -> Result<Self, SourceError> {
        // A trailing slash keeps `Url::join` from replacing the last segment.
        let mut base = config.base_url.trim_end_matches('/').to_string();
        base.push('/');
        let base_url = Url::parse(&base).map_err(|e| SourceError::config(e.to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SourceError::config(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            token: config.token,
            page_size: config.page_size.max(1),
        })
    }

    fn collection_url(&self, kind: SourceKind) -> Result<Url, SourceError> {
        self.base_url
            .join(kind.collection())
            .map_err(|e| SourceError::config(e.to_string()))
    }

    fn page_url(&self, kind: SourceKind, page: u32) -> Result<Url, SourceError> {
        let mut url = self.collection_url(kind)?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("limit", &self.page_size.to_string());
        Ok(url)
    }

    fn record_url(&self, kind: SourceKind, id: &str) -> Result<Url, SourceError> {
        let mut url = self.collection_url(kind)?;
        url.path_segments_mut()
            .map_err(|_| SourceError::config("Base URL cannot carry a path"))?
            .push(id);
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Turn a non-success status into an error, keeping the body for context.
    async fn check_status(response: Response) -> Result<Response, SourceError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        warn!(status = %status, body = %body, "Content API request failed");
        Err(SourceError::StatusError {
            status: status.as_u16(),
            body,
        })
    }
}

/// Decode one page of a collection.
///
/// Accepts a bare array or an object wrapping the array under `items` (or
/// `data`). Only a page of the wrong shape is an error; records that fail to
/// decode are returned as malformed.
fn decode_page(kind: SourceKind, body: Value) -> Result<RecordBatch, SourceError> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(mut wrapper) => match wrapper.remove("items").or_else(|| wrapper.remove("data")) {
            Some(Value::Array(items)) => items,
            Some(Value::Null) | None => Vec::new(),
            Some(_) => return Err(SourceError::decode("Page items are not an array")),
        },
        Value::Null => Vec::new(),
        _ => return Err(SourceError::decode("Page is neither an array nor an object")),
    };

    Ok(RecordBatch::decode(kind, items))
}

#[async_trait]
impl ContentSource for HttpContentSource {
    #[instrument(skip(self), fields(collection = %kind))]
    async fn fetch_page(&self, kind: SourceKind, page: u32) -> Result<RecordBatch, SourceError> {
        let url = self.page_url(kind, page)?;
        let response = self.authorized(self.client.get(url)).send().await?;
        let body: Value = Self::check_status(response).await?.json().await?;

        let batch = decode_page(kind, body)?;
        debug!(
            count = batch.records.len(),
            malformed = batch.malformed.len(),
            "Fetched page"
        );
        Ok(batch)
    }

    async fn fetch_by_id(
        &self,
        kind: SourceKind,
        id: &str,
    ) -> Result<Option<SourceRecord>, SourceError> {
        let url = self.record_url(kind, id)?;
        let response = self.authorized(self.client.get(url)).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(collection = %kind, id = %id, "Record not found");
            return Ok(None);
        }

        let body: Value = Self::check_status(response).await?.json().await?;
        let record = SourceRecord::from_json(kind, body)?;
        Ok(Some(record))
    }

    async fn update_by_id(
        &self,
        kind: SourceKind,
        id: &str,
        patch: &Value,
    ) -> Result<(), SourceError> {
        let url = self.record_url(kind, id)?;
        let response = self
            .authorized(self.client.patch(url).json(patch))
            .send()
            .await?;
        Self::check_status(response).await?;

        debug!(collection = %kind, id = %id, "Record updated");
        Ok(())
    }
}
