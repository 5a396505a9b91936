//! Indexers module for the catalog search pipeline.
//!
//! One [`DocumentBuilder`] per entity kind turns a source record into its
//! denormalized document. [`EntityIndexer`] drives a builder: it fetches the
//! primary and auxiliary collections, builds every document, writes them and
//! removes what went stale.

mod affiliate;
mod brand;
mod carousel;
mod category;
mod charity;
mod episode;
mod offer;
mod series;
mod star;

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::entity_map::{EntityMap, JoinContext};
use crate::errors::{PipelineError, SourceError};
use crate::loader::SearchLoader;
use crate::report::{IndexReport, SkipReason, SkippedRecord};
use crate::source::{ContentSource, EnvironmentScope};
use catalog_search_shared::{EntityKind, IndexDocument, SourceKind, SourceRecord};

pub use affiliate::AffiliateBuilder;
pub use brand::BrandBuilder;
pub use carousel::CarouselBuilder;
pub use category::CategoryBuilder;
pub use charity::CharityBuilder;
pub use episode::EpisodeBuilder;
pub use offer::OfferBuilder;
pub use series::SeriesBuilder;
pub use star::{StarBuilder, MAX_STAR_EPISODES};

/// Builds the denormalized document of one entity kind.
pub trait DocumentBuilder: Send + Sync {
    fn kind(&self) -> EntityKind;

    /// Collections the joins of this kind resolve against.
    fn auxiliary(&self) -> &'static [SourceKind];

    /// Build the document for `record`.
    ///
    /// Optional relations that do not resolve are dropped. A required one
    /// that does not resolve yields a [`SkipReason`] instead of a document.
    fn build(&self, record: &SourceRecord, context: &JoinContext)
        -> Result<IndexDocument, SkipReason>;
}

static BRAND: BrandBuilder = BrandBuilder;
static STAR: StarBuilder = StarBuilder;
static CHARITY: CharityBuilder = CharityBuilder;
static CATEGORY: CategoryBuilder = CategoryBuilder;
static EPISODE: EpisodeBuilder = EpisodeBuilder;
static SERIES: SeriesBuilder = SeriesBuilder;
static OFFER: OfferBuilder = OfferBuilder;
static CAROUSEL: CarouselBuilder = CarouselBuilder;
static AFFILIATE: AffiliateBuilder = AffiliateBuilder;

/// The builder bound to `kind`.
pub fn builder_for(kind: EntityKind) -> &'static dyn DocumentBuilder {
    match kind {
        EntityKind::Brand => &BRAND,
        EntityKind::Star => &STAR,
        EntityKind::Charity => &CHARITY,
        EntityKind::Category => &CATEGORY,
        EntityKind::Episode => &EPISODE,
        EntityKind::Series => &SERIES,
        EntityKind::Offer => &OFFER,
        EntityKind::Carousel => &CAROUSEL,
        EntityKind::Affiliate => &AFFILIATE,
    }
}

/// Star IDs of an episode: the ordered `star` list when present, else the
/// single `star_id`.
pub(crate) fn episode_star_ids(episode: &SourceRecord) -> Vec<String> {
    if episode.ordered.contains_key("star") {
        episode.ordered_ids("star")
    } else {
        episode.ref_id("star_id").into_iter().collect()
    }
}

/// Build a document per record, splitting off the records that were skipped.
pub fn build_documents(
    builder: &dyn DocumentBuilder,
    records: &[SourceRecord],
    context: &JoinContext,
) -> (Vec<IndexDocument>, Vec<SkippedRecord>) {
    let mut documents = Vec::with_capacity(records.len());
    let mut skipped = Vec::new();

    for record in records {
        match builder.build(record, context) {
            Ok(document) => documents.push(document),
            Err(reason) => {
                debug!(id = %record.id, reason = ?reason, "Skipping record");
                skipped.push(SkippedRecord::new(record.id.clone(), reason));
            }
        }
    }

    (documents, skipped)
}

/// Reconciles one entity kind between the content source and the store.
pub struct EntityIndexer {
    builder: &'static dyn DocumentBuilder,
    source: Arc<dyn ContentSource>,
    loader: Arc<SearchLoader>,
    environment: String,
}

impl EntityIndexer {
    pub fn new(
        kind: EntityKind,
        source: Arc<dyn ContentSource>,
        loader: Arc<SearchLoader>,
        environment: impl Into<String>,
    ) -> Self {
        Self {
            builder: builder_for(kind),
            source,
            loader,
            environment: environment.into(),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.builder.kind()
    }

    /// Fetch every auxiliary collection, unfiltered, and key it by ID.
    /// Malformed auxiliary records simply do not resolve.
    async fn load_context(&self) -> Result<JoinContext, SourceError> {
        let mut context = JoinContext::new();
        for &kind in self.builder.auxiliary() {
            let collection = self.source.fetch_all(kind, &EnvironmentScope::Any).await?;
            debug!(
                collection = %kind,
                count = collection.records.len(),
                malformed = collection.malformed.len(),
                "Loaded auxiliary collection"
            );
            context.insert(kind, EntityMap::build(collection.records));
        }
        Ok(context)
    }

    /// Index every record of this kind tagged with the environment, then
    /// delete whatever else the store holds for the kind.
    ///
    /// All auxiliary maps are resolved before the first write. Deletions
    /// start only after every upsert has finished.
    #[instrument(skip(self), fields(kind = %self.kind(), environment = %self.environment))]
    pub async fn index_all(&self) -> Result<IndexReport, PipelineError> {
        let kind = self.kind();
        let scope = EnvironmentScope::only(&self.environment);

        let fetched = self.source.fetch_all(kind.into(), &scope).await?;
        let context = self.load_context().await?;

        let (documents, mut skipped) = build_documents(self.builder, &fetched.records, &context);
        skipped.extend(fetched.malformed.iter().map(SkippedRecord::malformed));
        let upserted = self.loader.upsert_all(kind, &documents).await;

        // A failed write or an undecodable payload keeps its predecessor.
        let keep: HashSet<String> = documents
            .iter()
            .map(|d| d.id().to_string())
            .chain(fetched.malformed.iter().filter_map(|m| m.id.clone()))
            .collect();
        let deleted = self.loader.delete_stale(kind, &keep).await?;

        info!(
            fetched = fetched.records.len(),
            malformed = fetched.malformed.len(),
            upserted = upserted.succeeded,
            failed = upserted.failed,
            skipped = skipped.len(),
            deleted = deleted.succeeded,
            "Indexed kind"
        );

        Ok(IndexReport {
            kind,
            upserted,
            skipped,
            deleted,
        })
    }

    /// Index a single record.
    ///
    /// Returns the written document, or `None` when the record is unknown,
    /// not tagged with the environment, or skipped by its builder. In those
    /// cases any stored copy is removed, matching what a full run would do.
    #[instrument(skip(self), fields(kind = %self.kind()))]
    pub async fn index_by_id(&self, id: &str) -> Result<Option<IndexDocument>, PipelineError> {
        let kind = self.kind();

        let record = match self.source.fetch_by_id(kind.into(), id).await? {
            Some(record) if record.is_in_environment(&self.environment) => record,
            Some(_) => {
                info!(id = %id, environment = %self.environment, "Record not in environment");
                self.loader.delete_one(kind, id).await?;
                return Ok(None);
            }
            None => {
                info!(id = %id, "Record not found in source");
                self.loader.delete_one(kind, id).await?;
                return Ok(None);
            }
        };

        let context = self.load_context().await?;
        match self.builder.build(&record, &context) {
            Ok(document) => {
                self.loader.upsert_one(&document).await?;
                info!(id = %id, "Indexed record");
                Ok(Some(document))
            }
            Err(reason) => {
                info!(id = %id, reason = ?reason, "Record skipped");
                self.loader.delete_one(kind, id).await?;
                Ok(None)
            }
        }
    }

    /// Remove a single document from the store.
    pub async fn delete_by_id(&self, id: &str) -> Result<(), PipelineError> {
        self.loader.delete_one(self.kind(), id).await?;
        info!(kind = %self.kind(), id = %id, "Deleted document");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{InMemorySearchClient, InMemorySource};
    use catalog_search_shared::{is_typed_field, OrderedRef};
    use serde_json::{json, Value};
    use std::collections::BTreeSet;

    #[test]
    fn test_registry_is_closed_over_every_kind() {
        for kind in EntityKind::ALL {
            assert_eq!(builder_for(kind).kind(), kind);
        }
    }

    #[test]
    fn test_episode_star_ids_prefers_ordered_list() {
        let episode = SourceRecord::new(EntityKind::Episode, "e1")
            .with_ordered(
                "star",
                vec![OrderedRef::new("s2", 1), OrderedRef::new("s1", 0)],
            )
            .with_field("star_id", json!("s9"));
        assert_eq!(episode_star_ids(&episode), vec!["s1", "s2"]);

        let episode = SourceRecord::new(EntityKind::Episode, "e2").with_field("star_id", json!("s9"));
        assert_eq!(episode_star_ids(&episode), vec!["s9"]);

        let episode = SourceRecord::new(EntityKind::Episode, "e3");
        assert!(episode_star_ids(&episode).is_empty());
    }

    #[test]
    fn test_attributes_never_reuse_typed_field_names() {
        // Lets the offer builder find an owning brand.
        let context = JoinContext::new().with(
            EntityKind::Brand,
            vec![SourceRecord::new(EntityKind::Brand, "b1").with_field("offer", json!(["x1"]))],
        );

        let mut typed = BTreeSet::new();
        for kind in EntityKind::ALL {
            let document = builder_for(kind)
                .build(&SourceRecord::new(kind, "x1"), &context)
                .unwrap();
            let Value::Object(fields) = document.to_value().unwrap() else {
                panic!("{} document is not an object", kind);
            };
            typed.extend(fields.keys().cloned());
        }

        for name in &typed {
            assert!(is_typed_field(name), "{} is missing from the typed fields", name);
        }

        for kind in EntityKind::ALL {
            let record = typed.iter().fold(SourceRecord::new(kind, "x1"), |record, name| {
                record.with_field(name.clone(), json!(["raw"]))
            });
            let document = builder_for(kind).build(&record, &context).unwrap();

            let leaked: Vec<&String> = document
                .base()
                .attributes
                .keys()
                .filter(|name| typed.contains(*name))
                .collect();
            assert!(leaked.is_empty(), "{} document copies {:?}", kind, leaked);
        }
    }

    fn indexer(
        kind: EntityKind,
        source: InMemorySource,
        client: Arc<InMemorySearchClient>,
    ) -> EntityIndexer {
        EntityIndexer::new(
            kind,
            Arc::new(source),
            Arc::new(SearchLoader::new(client)),
            "production",
        )
    }

    fn charity(id: &str, environment: &str) -> SourceRecord {
        SourceRecord::new(EntityKind::Charity, id)
            .with_title(format!("Charity {}", id))
            .in_environment(environment)
    }

    #[tokio::test]
    async fn test_index_all_filters_environment_and_removes_stale() {
        let client = Arc::new(InMemorySearchClient::new());
        client
            .insert_raw(EntityKind::Charity, "gone", json!({"id": "gone", "type": "charity"}))
            .await;
        client
            .insert_raw(EntityKind::Charity, "c2", json!({"id": "c2", "type": "charity"}))
            .await;

        let source = InMemorySource::new().with_records(
            EntityKind::Charity,
            vec![charity("c1", "production"), charity("c2", "staging")],
        );
        let report = indexer(EntityKind::Charity, source, client.clone())
            .index_all()
            .await
            .unwrap();

        assert!(report.is_clean());
        assert_eq!(report.upserted.succeeded, 1);
        assert_eq!(report.deleted.succeeded, 2);
        assert_eq!(client.ids(EntityKind::Charity).await, vec!["c1"]);
    }

    #[tokio::test]
    async fn test_index_all_keeps_documents_whose_write_failed() {
        let client = Arc::new(InMemorySearchClient::new().failing_on("c2"));
        client
            .insert_raw(EntityKind::Charity, "c2", json!({"id": "c2", "type": "charity", "title": "old"}))
            .await;

        let source = InMemorySource::new().with_records(
            EntityKind::Charity,
            vec![charity("c1", "production"), charity("c2", "production")],
        );
        let report = indexer(EntityKind::Charity, source, client.clone())
            .index_all()
            .await
            .unwrap();

        assert!(!report.is_clean());
        assert_eq!(report.upserted.failed, 1);
        assert_eq!(report.deleted.total, 0);
        assert_eq!(client.ids(EntityKind::Charity).await, vec!["c1", "c2"]);
    }

    #[tokio::test]
    async fn test_index_all_reports_malformed_records_and_keeps_going() {
        let client = Arc::new(InMemorySearchClient::new());
        client
            .insert_raw(EntityKind::Charity, "c2", json!({"id": "c2", "type": "charity", "title": "old"}))
            .await;
        client
            .insert_raw(EntityKind::Charity, "c9", json!({"id": "c9", "type": "charity"}))
            .await;

        let source = InMemorySource::new().with_raw(
            EntityKind::Charity,
            vec![
                json!({"id": "c1", "title": "Good", "environments": ["production"]}),
                json!({"id": "c2", "environments": ["production"], "pictures": [{"type": "cover"}]}),
                json!({"title": "no id", "environments": ["production"], "pictures": 7}),
                json!({"id": "c3", "environments": ["staging"], "pictures": "bad"}),
            ],
        );
        let report = indexer(EntityKind::Charity, source, client.clone())
            .index_all()
            .await
            .unwrap();

        assert_eq!(report.upserted.succeeded, 1);
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(report.skipped[0].id.as_deref(), Some("c2"));
        assert!(matches!(report.skipped[0].reason, SkipReason::Malformed { .. }));
        assert_eq!(report.skipped[1].id, None);
        // c2 keeps its previous copy, c9 is stale.
        assert_eq!(client.ids(EntityKind::Charity).await, vec!["c1", "c2"]);
        assert_eq!(client.document(EntityKind::Charity, "c2").await.unwrap()["title"], "old");
    }

    #[tokio::test]
    async fn test_malformed_auxiliary_record_does_not_abort_joins() {
        let client = Arc::new(InMemorySearchClient::new());
        let source = InMemorySource::new()
            .with_records(
                EntityKind::Brand,
                vec![SourceRecord::new(EntityKind::Brand, "b1")
                    .in_environment("production")
                    .with_field("offer", json!(["o1", "o2"]))],
            )
            .with_raw(
                EntityKind::Offer,
                vec![
                    json!({"id": "o1", "title": "Ten off"}),
                    json!({"id": "o2", "pictures": 7}),
                ],
            );

        let report = indexer(EntityKind::Brand, source, client.clone())
            .index_all()
            .await
            .unwrap();

        assert!(report.is_clean());
        assert!(report.skipped.is_empty());
        let brand = client.document(EntityKind::Brand, "b1").await.unwrap();
        assert_eq!(brand["offers"], json!([{"id": "o1", "title": "Ten off", "slug": null}]));
    }

    #[tokio::test]
    async fn test_index_all_propagates_source_failure() {
        let client = Arc::new(InMemorySearchClient::new());
        let source = InMemorySource::new().failing();

        let result = indexer(EntityKind::Charity, source, client.clone()).index_all().await;

        assert!(matches!(result, Err(PipelineError::SourceUnavailable(_))));
    }

    #[tokio::test]
    async fn test_index_by_id_writes_one_document() {
        let client = Arc::new(InMemorySearchClient::new());
        let source = InMemorySource::new().with_records(
            EntityKind::Charity,
            vec![charity("c1", "production"), charity("c2", "production")],
        );

        let document = indexer(EntityKind::Charity, source, client.clone())
            .index_by_id("c2")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(document.id(), "c2");
        assert_eq!(client.ids(EntityKind::Charity).await, vec!["c2"]);
    }

    #[tokio::test]
    async fn test_index_by_id_removes_record_outside_environment() {
        let client = Arc::new(InMemorySearchClient::new());
        client
            .insert_raw(EntityKind::Charity, "c1", json!({"id": "c1", "type": "charity"}))
            .await;
        let source = InMemorySource::new()
            .with_records(EntityKind::Charity, vec![charity("c1", "staging")]);

        let indexer = indexer(EntityKind::Charity, source, client.clone());

        assert!(indexer.index_by_id("c1").await.unwrap().is_none());
        assert!(indexer.index_by_id("missing").await.unwrap().is_none());
        assert!(client.ids(EntityKind::Charity).await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_by_id() {
        let client = Arc::new(InMemorySearchClient::new());
        client
            .insert_raw(EntityKind::Star, "s1", json!({"id": "s1", "type": "star"}))
            .await;

        indexer(EntityKind::Star, InMemorySource::new(), client.clone())
            .delete_by_id("s1")
            .await
            .unwrap();

        assert!(client.ids(EntityKind::Star).await.is_empty());
    }
}
