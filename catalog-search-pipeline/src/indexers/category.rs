use catalog_search_shared::{
    CategoryDocument, DocumentBase, EntityKind, EpisodeSummary, IndexDocument, SourceKind,
    SourceRecord,
};

use super::DocumentBuilder;
use crate::entity_map::JoinContext;
use crate::report::SkipReason;

/// Categories embed every episode that lists them.
pub struct CategoryBuilder;

impl DocumentBuilder for CategoryBuilder {
    fn kind(&self) -> EntityKind {
        EntityKind::Category
    }

    fn auxiliary(&self) -> &'static [SourceKind] {
        &[SourceKind::Entity(EntityKind::Episode)]
    }

    fn build(
        &self,
        record: &SourceRecord,
        context: &JoinContext,
    ) -> Result<IndexDocument, SkipReason> {
        let episodes: Vec<EpisodeSummary> = context
            .records(EntityKind::Episode)
            .filter(|episode| episode.references("category", &record.id))
            .map(EpisodeSummary::of)
            .collect();

        Ok(IndexDocument::Category(CategoryDocument {
            base: DocumentBase::from_record(EntityKind::Category, record, &[]),
            episodes: episodes.into(),
        }))
    }
}
