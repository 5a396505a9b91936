//! Maintenance operations that patch the content source directly.

use serde_json::json;
use tracing::info;

use crate::AppError;
use catalog_search_pipeline::ContentSource;
use catalog_search_shared::EntityKind;

/// Add `environment` to the tags of a record.
///
/// Returns `false` when the record already carried the tag and nothing was
/// written.
pub async fn tag_environment(
    source: &dyn ContentSource,
    kind: EntityKind,
    id: &str,
    environment: &str,
) -> Result<bool, AppError> {
    let record = source
        .fetch_by_id(kind.into(), id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("{} {}", kind, id)))?;

    if record.is_in_environment(environment) {
        info!(kind = %kind, id = %id, environment = %environment, "Record already tagged");
        return Ok(false);
    }

    let mut environments: Vec<String> = record.environments.into_iter().collect();
    environments.push(environment.to_string());
    environments.sort();

    source
        .update_by_id(kind.into(), id, &json!({ "environments": environments }))
        .await?;

    info!(kind = %kind, id = %id, environment = %environment, "Tagged record");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use catalog_search_pipeline::{RecordBatch, SourceError};
    use catalog_search_shared::{SourceKind, SourceRecord};
    use serde_json::Value;
    use tokio::sync::Mutex;

    /// Mock source holding a single record and recording patches.
    struct MockSource {
        record: SourceRecord,
        patches: Mutex<Vec<Value>>,
    }

    impl MockSource {
        fn new(record: SourceRecord) -> Self {
            Self {
                record,
                patches: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ContentSource for MockSource {
        async fn fetch_page(
            &self,
            _kind: SourceKind,
            _page: u32,
        ) -> Result<RecordBatch, SourceError> {
            Ok(RecordBatch::default())
        }

        async fn fetch_by_id(
            &self,
            _kind: SourceKind,
            id: &str,
        ) -> Result<Option<SourceRecord>, SourceError> {
            Ok((self.record.id == id).then(|| self.record.clone()))
        }

        async fn update_by_id(
            &self,
            _kind: SourceKind,
            _id: &str,
            patch: &Value,
        ) -> Result<(), SourceError> {
            self.patches.lock().await.push(patch.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_tag_environment_patches_missing_tag() {
        let source = MockSource::new(
            SourceRecord::new(EntityKind::Brand, "b1").in_environment("staging"),
        );

        let changed = tag_environment(&source, EntityKind::Brand, "b1", "production")
            .await
            .unwrap();

        assert!(changed);
        let patches = source.patches.lock().await;
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0]["environments"], json!(["production", "staging"]));
    }

    #[tokio::test]
    async fn test_tag_environment_is_noop_when_tagged() {
        let source = MockSource::new(
            SourceRecord::new(EntityKind::Brand, "b1").in_environment("production"),
        );

        let changed = tag_environment(&source, EntityKind::Brand, "b1", "production")
            .await
            .unwrap();

        assert!(!changed);
        assert!(source.patches.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_tag_environment_unknown_record() {
        let source = MockSource::new(SourceRecord::new(EntityKind::Brand, "b1"));
        let result = tag_environment(&source, EntityKind::Brand, "b2", "production").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
