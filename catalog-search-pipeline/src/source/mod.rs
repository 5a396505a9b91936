//! Source module for the catalog search pipeline.
//!
//! Provides the content source abstraction and its HTTP implementation.

mod http_source;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use crate::errors::SourceError;
use catalog_search_shared::{MalformedRecord, SourceKind, SourceRecord};

pub use http_source::{HttpContentSource, HttpSourceConfig};

/// Which records a collection fetch keeps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvironmentScope {
    /// Keep every record. Used for auxiliary fetches: a related record may
    /// belong to another environment and still appear in a summary.
    Any,
    /// Keep records tagged with this environment.
    Only(String),
}

impl EnvironmentScope {
    pub fn only(environment: impl Into<String>) -> Self {
        Self::Only(environment.into())
    }

    pub fn admits(&self, record: &SourceRecord) -> bool {
        match self {
            EnvironmentScope::Any => true,
            EnvironmentScope::Only(environment) => record.is_in_environment(environment),
        }
    }

    /// Payloads without readable environment tags are only admitted by `Any`.
    pub fn admits_malformed(&self, record: &MalformedRecord) -> bool {
        match self {
            EnvironmentScope::Any => true,
            EnvironmentScope::Only(environment) => record.is_in_environment(environment),
        }
    }
}

/// Records of a page or a whole collection, plus the payloads that failed
/// to decode. One bad payload never fails its page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordBatch {
    pub records: Vec<SourceRecord>,
    pub malformed: Vec<MalformedRecord>,
}

impl RecordBatch {
    /// Decode raw payloads one by one.
    pub fn decode(kind: SourceKind, items: Vec<Value>) -> Self {
        let mut batch = Self::default();
        for raw in items {
            match SourceRecord::decode(kind, raw) {
                Ok(record) => batch.records.push(record),
                Err(malformed) => {
                    warn!(
                        collection = %kind,
                        id = ?malformed.id,
                        error = %malformed.error,
                        "Skipping malformed record"
                    );
                    batch.malformed.push(malformed);
                }
            }
        }
        batch
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.malformed.is_empty()
    }
}

impl From<Vec<SourceRecord>> for RecordBatch {
    fn from(records: Vec<SourceRecord>) -> Self {
        Self {
            records,
            malformed: Vec::new(),
        }
    }
}

/// Read (and occasionally patch) access to the remote catalog.
///
/// Implementations do not retry; retry policy belongs to the caller.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Fetch one page of a collection. Pages are numbered from 1; an empty
    /// page marks the end of the collection.
    async fn fetch_page(&self, kind: SourceKind, page: u32) -> Result<RecordBatch, SourceError>;

    /// Fetch a single record, or `None` if the source does not know it.
    async fn fetch_by_id(
        &self,
        kind: SourceKind,
        id: &str,
    ) -> Result<Option<SourceRecord>, SourceError>;

    /// Apply a partial update to a record. Used by maintenance commands only.
    async fn update_by_id(&self, kind: SourceKind, id: &str, patch: &Value)
        -> Result<(), SourceError>;

    /// Fetch a whole collection, paging until an empty page, and keep the
    /// records and malformed payloads admitted by `scope`.
    async fn fetch_all(
        &self,
        kind: SourceKind,
        scope: &EnvironmentScope,
    ) -> Result<RecordBatch, SourceError> {
        let mut collection = RecordBatch::default();
        let mut page = 1;

        loop {
            let batch = self.fetch_page(kind, page).await?;
            if batch.is_empty() {
                break;
            }
            collection
                .records
                .extend(batch.records.into_iter().filter(|record| scope.admits(record)));
            collection.malformed.extend(
                batch
                    .malformed
                    .into_iter()
                    .filter(|record| scope.admits_malformed(record)),
            );
            page += 1;
        }

        Ok(collection)
    }
}
