//! Result types for batch operations against the search store.

use serde::Serialize;

use catalog_search_shared::EntityKind;

/// Result of a batch operation for a single document.
///
/// This struct represents the outcome of a single operation within a batch
/// (indexing or deleting one document). It indicates whether the operation
/// succeeded and includes error details if it failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchOperationResult {
    /// Kind of the document.
    pub kind: EntityKind,
    /// The document's source ID.
    pub id: String,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Error message if the operation failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchOperationResult {
    pub fn succeeded(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            success: true,
            error: None,
        }
    }

    pub fn failed(kind: EntityKind, id: impl Into<String>, error: impl ToString) -> Self {
        Self {
            kind,
            id: id.into(),
            success: false,
            error: Some(error.to_string()),
        }
    }
}

/// Summary of a batch operation containing aggregate statistics and individual results.
///
/// A batch is never aborted by a single failure; failed items are reported
/// here so callers can see exactly which documents did not make it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchOperationSummary {
    /// Total number of items in the batch.
    pub total: usize,
    /// Number of successful operations.
    pub succeeded: usize,
    /// Number of failed operations.
    pub failed: usize,
    /// Individual results for each item.
    pub results: Vec<BatchOperationResult>,
}

impl BatchOperationSummary {
    /// Summary of an empty batch.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a summary from per-item results.
    pub fn from_results(results: Vec<BatchOperationResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }

    /// Results of the items that failed.
    pub fn failures(&self) -> impl Iterator<Item = &BatchOperationResult> {
        self.results.iter().filter(|r| !r.success)
    }

    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}
