use catalog_search_shared::{
    CarouselDocument, DocumentBase, EntityKind, EpisodeSummary, IndexDocument, SourceKind,
    SourceRecord,
};

use super::DocumentBuilder;
use crate::entity_map::JoinContext;
use crate::report::SkipReason;

/// Carousels embed their episodes in slot order.
pub struct CarouselBuilder;

impl DocumentBuilder for CarouselBuilder {
    fn kind(&self) -> EntityKind {
        EntityKind::Carousel
    }

    fn auxiliary(&self) -> &'static [SourceKind] {
        &[SourceKind::Entity(EntityKind::Episode)]
    }

    fn build(
        &self,
        record: &SourceRecord,
        context: &JoinContext,
    ) -> Result<IndexDocument, SkipReason> {
        let episodes = context
            .resolve_all(EntityKind::Episode, record.ordered_ids("episodes"))
            .into_iter()
            .map(EpisodeSummary::of)
            .collect();

        Ok(IndexDocument::Carousel(CarouselDocument {
            base: DocumentBase::from_record(EntityKind::Carousel, record, &[]),
            episodes,
        }))
    }
}
