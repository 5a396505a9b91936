//! Reports returned by indexing runs.

use serde::Serialize;

use catalog_search_repository::BatchOperationSummary;
use catalog_search_shared::{EntityKind, MalformedRecord};

/// Why a source record produced no document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// A relation the document cannot exist without did not resolve.
    RelationUnresolved { relation: String },
    /// The source payload could not be decoded.
    Malformed { message: String },
}

impl SkipReason {
    pub fn relation_unresolved(relation: impl Into<String>) -> Self {
        Self::RelationUnresolved {
            relation: relation.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    /// Absent for a malformed payload that carried no usable ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub reason: SkipReason,
}

impl SkippedRecord {
    pub fn new(id: impl Into<String>, reason: SkipReason) -> Self {
        Self {
            id: Some(id.into()),
            reason,
        }
    }

    pub fn malformed(record: &MalformedRecord) -> Self {
        Self {
            id: record.id.clone(),
            reason: SkipReason::Malformed {
                message: record.error.to_string(),
            },
        }
    }
}

/// Outcome of indexing every record of one kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    pub kind: EntityKind,
    /// One entry per document written.
    pub upserted: BatchOperationSummary,
    /// Records that produced no document.
    pub skipped: Vec<SkippedRecord>,
    /// One entry per stale document removed.
    pub deleted: BatchOperationSummary,
}

impl IndexReport {
    /// Whether every write and delete in the run succeeded. Skips do not
    /// count as failures.
    pub fn is_clean(&self) -> bool {
        self.upserted.is_clean() && self.deleted.is_clean()
    }
}

/// Outcome of a full reindex: one report per kind, per pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReindexReport {
    pub passes: Vec<Vec<IndexReport>>,
}

impl ReindexReport {
    pub fn is_clean(&self) -> bool {
        self.reports().all(IndexReport::is_clean)
    }

    pub fn reports(&self) -> impl Iterator<Item = &IndexReport> {
        self.passes.iter().flatten()
    }

    /// Reports of the last pass, which reflect the final store state.
    pub fn last_pass(&self) -> &[IndexReport] {
        self.passes.last().map(Vec::as_slice).unwrap_or_default()
    }
}
