//! In-memory collaborators shared by the unit tests of this crate.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex as StdMutex;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::errors::SourceError;
use crate::source::{ContentSource, RecordBatch};
use catalog_search_repository::{SearchEngineClient, SearchError};
use catalog_search_shared::{
    CharityDocument, DocumentBase, EntityKind, IndexDocument, MalformedRecord, SearchHit,
    SearchQuery, SearchResponse, SourceKind, SourceRecord,
};

/// A charity document, the simplest kind to build.
pub fn charity_document(id: &str) -> IndexDocument {
    let record = SourceRecord::new(EntityKind::Charity, id)
        .with_title(format!("Charity {}", id))
        .in_environment("production");
    IndexDocument::Charity(CharityDocument {
        base: DocumentBase::from_record(EntityKind::Charity, &record, &[]),
    })
}

/// Search store keeping documents in a map keyed by `(kind, id)`.
#[derive(Default)]
pub struct InMemorySearchClient {
    documents: Mutex<BTreeMap<(EntityKind, String), Value>>,
    failing_ids: HashSet<String>,
    flaky_failures: AtomicUsize,
    unavailable: bool,
    pub index_calls: AtomicUsize,
    pub search_calls: AtomicUsize,
}

impl InMemorySearchClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject writes of `id` with a permanent error.
    pub fn failing_on(mut self, id: &str) -> Self {
        self.failing_ids.insert(id.to_string());
        self
    }

    /// Fail the next `count` writes with a transient error.
    pub fn flaky(self, count: usize) -> Self {
        self.flaky_failures.store(count, Ordering::SeqCst);
        self
    }

    /// Fail every call with a permanent error.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    pub async fn insert_raw(&self, kind: EntityKind, id: &str, document: Value) {
        self.documents
            .lock()
            .await
            .insert((kind, id.to_string()), document);
    }

    pub async fn document(&self, kind: EntityKind, id: &str) -> Option<Value> {
        self.documents
            .lock()
            .await
            .get(&(kind, id.to_string()))
            .cloned()
    }

    /// Stored IDs of `kind`, sorted.
    pub async fn ids(&self, kind: EntityKind) -> Vec<String> {
        self.documents
            .lock()
            .await
            .keys()
            .filter(|(k, _)| *k == kind)
            .map(|(_, id)| id.clone())
            .collect()
    }

    /// Every stored document with `indexed_at` removed, for state comparisons.
    pub async fn snapshot_without_timestamps(&self) -> BTreeMap<(EntityKind, String), Value> {
        let mut snapshot = self.documents.lock().await.clone();
        for document in snapshot.values_mut() {
            if let Value::Object(fields) = document {
                fields.remove("indexed_at");
            }
        }
        snapshot
    }

    fn check_available(&self) -> Result<(), SearchError> {
        if self.unavailable {
            return Err(SearchError::query("store is read-only"));
        }
        Ok(())
    }

    fn matches(query: &SearchQuery, kind: EntityKind, id: &str, document: &Value) -> bool {
        if !query.types.iter().any(|t| t == kind.as_str()) {
            return false;
        }
        if !query.ids.is_empty() && !query.ids.iter().any(|i| i == id) {
            return false;
        }
        if query
            .exists
            .iter()
            .any(|field| document.get(field).map_or(true, Value::is_null))
        {
            return false;
        }
        match query.text_term() {
            None => true,
            Some(term) => {
                let text = ["name", "title"]
                    .iter()
                    .filter_map(|field| document.get(*field).and_then(Value::as_str))
                    .collect::<Vec<_>>()
                    .join(" ")
                    .to_lowercase();
                term.replace('$', "")
                    .split_whitespace()
                    .all(|token| text.contains(&token.to_lowercase()))
            }
        }
    }
}

#[async_trait]
impl SearchEngineClient for InMemorySearchClient {
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SearchError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let documents = self.documents.lock().await;
        let matching: Vec<SearchHit> = documents
            .iter()
            .filter(|((kind, id), document)| Self::matches(query, *kind, id, document))
            .map(|((kind, id), document)| SearchHit {
                kind: kind.as_str().to_string(),
                id: id.clone(),
                source: document.clone(),
            })
            .collect();

        Ok(SearchResponse {
            total: matching.len() as u64,
            hits: matching
                .into_iter()
                .skip(query.offset)
                .take(query.limit)
                .collect(),
        })
    }

    async fn index_document(&self, document: &IndexDocument) -> Result<(), SearchError> {
        self.index_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let remaining = self.flaky_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.flaky_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(SearchError::connection("connection refused"));
        }
        if self.failing_ids.contains(document.id()) {
            return Err(SearchError::index("document rejected"));
        }

        self.insert_raw(document.kind(), document.id(), document.to_value()?)
            .await;
        Ok(())
    }

    async fn delete_document(&self, kind: EntityKind, id: &str) -> Result<(), SearchError> {
        self.check_available()?;
        self.documents.lock().await.remove(&(kind, id.to_string()));
        Ok(())
    }

    async fn list_document_ids(&self, kind: EntityKind) -> Result<Vec<String>, SearchError> {
        self.check_available()?;
        Ok(self.ids(kind).await)
    }

    async fn ensure_index_exists(&self) -> Result<(), SearchError> {
        self.check_available()
    }

    async fn health_check(&self) -> Result<bool, SearchError> {
        Ok(!self.unavailable)
    }
}

/// Content source serving fixed collections in pages.
pub struct InMemorySource {
    collections: StdMutex<HashMap<SourceKind, Vec<SourceRecord>>>,
    /// Served on the first page of their collection.
    malformed: StdMutex<HashMap<SourceKind, Vec<MalformedRecord>>>,
    page_size: usize,
    failing: bool,
    page_requests: AtomicUsize,
}

impl Default for InMemorySource {
    fn default() -> Self {
        Self {
            collections: StdMutex::new(HashMap::new()),
            malformed: StdMutex::new(HashMap::new()),
            page_size: 100,
            failing: false,
            page_requests: AtomicUsize::new(0),
        }
    }
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_records(self, kind: impl Into<SourceKind>, records: Vec<SourceRecord>) -> Self {
        self.set_records(kind, records);
        self
    }

    /// Decode raw payloads into a collection, appending to what it holds.
    pub fn with_raw(self, kind: impl Into<SourceKind>, items: Vec<Value>) -> Self {
        let kind = kind.into();
        let batch = RecordBatch::decode(kind, items);
        self.collections
            .lock()
            .unwrap()
            .entry(kind)
            .or_default()
            .extend(batch.records);
        self.malformed
            .lock()
            .unwrap()
            .entry(kind)
            .or_default()
            .extend(batch.malformed);
        self
    }

    /// Fail every request with a transport error.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    /// Replace a collection, e.g. to simulate upstream edits between runs.
    pub fn set_records(&self, kind: impl Into<SourceKind>, records: Vec<SourceRecord>) {
        self.collections
            .lock()
            .unwrap()
            .insert(kind.into(), records);
    }

    pub fn page_requests(&self) -> usize {
        self.page_requests.load(Ordering::SeqCst)
    }

    pub fn record(&self, kind: impl Into<SourceKind>, id: &str) -> Option<SourceRecord> {
        self.collections
            .lock()
            .unwrap()
            .get(&kind.into())
            .and_then(|records| records.iter().find(|r| r.id == id).cloned())
    }

    fn check_available(&self) -> Result<(), SourceError> {
        if self.failing {
            return Err(SourceError::transport("connection reset by peer"));
        }
        Ok(())
    }
}

#[async_trait]
impl ContentSource for InMemorySource {
    async fn fetch_page(&self, kind: SourceKind, page: u32) -> Result<RecordBatch, SourceError> {
        self.page_requests.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let start = (page.max(1) as usize - 1) * self.page_size;
        let records: Vec<SourceRecord> = self
            .collections
            .lock()
            .unwrap()
            .get(&kind)
            .map(|records| {
                records
                    .iter()
                    .skip(start)
                    .take(self.page_size)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        let malformed = if page <= 1 {
            self.malformed
                .lock()
                .unwrap()
                .get(&kind)
                .cloned()
                .unwrap_or_default()
        } else {
            Vec::new()
        };

        Ok(RecordBatch { records, malformed })
    }

    async fn fetch_by_id(
        &self,
        kind: SourceKind,
        id: &str,
    ) -> Result<Option<SourceRecord>, SourceError> {
        self.check_available()?;
        Ok(self.record(kind, id))
    }

    async fn update_by_id(
        &self,
        kind: SourceKind,
        id: &str,
        patch: &Value,
    ) -> Result<(), SourceError> {
        self.check_available()?;

        let mut collections = self.collections.lock().unwrap();
        let record = collections
            .get_mut(&kind)
            .and_then(|records| records.iter_mut().find(|r| r.id == id))
            .ok_or_else(|| SourceError::StatusError {
                status: 404,
                body: format!("{} {} not found", kind, id),
            })?;

        if let Value::Object(fields) = patch {
            for (name, value) in fields {
                match (name.as_str(), value) {
                    ("environments", Value::Array(tags)) => {
                        record.environments = tags
                            .iter()
                            .filter_map(Value::as_str)
                            .map(String::from)
                            .collect();
                    }
                    ("title", Value::String(title)) => record.title = Some(title.clone()),
                    _ => {
                        record.fields.insert(name.clone(), value.clone());
                    }
                }
            }
        }
        Ok(())
    }
}
