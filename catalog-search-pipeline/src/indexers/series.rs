use catalog_search_shared::{
    BrandSummary, DocumentBase, EntityKind, EntitySummary, EpisodeSummary, IndexDocument,
    SeriesDocument, SourceKind, SourceRecord,
};

use super::DocumentBuilder;
use crate::entity_map::JoinContext;
use crate::report::SkipReason;

/// Series embed their charities, their brands with the brands' offers, and
/// their episodes.
pub struct SeriesBuilder;

impl SeriesBuilder {
    fn brand_summary(brand: &SourceRecord, context: &JoinContext) -> BrandSummary {
        BrandSummary {
            summary: EntitySummary::of(brand),
            offers: context
                .resolve_all(EntityKind::Offer, brand.ref_ids("offer"))
                .into_iter()
                .map(EntitySummary::of)
                .collect(),
        }
    }
}

impl DocumentBuilder for SeriesBuilder {
    fn kind(&self) -> EntityKind {
        EntityKind::Series
    }

    fn auxiliary(&self) -> &'static [SourceKind] {
        &[
            SourceKind::Entity(EntityKind::Charity),
            SourceKind::Entity(EntityKind::Brand),
            SourceKind::Entity(EntityKind::Offer),
            SourceKind::Entity(EntityKind::Episode),
        ]
    }

    fn build(
        &self,
        record: &SourceRecord,
        context: &JoinContext,
    ) -> Result<IndexDocument, SkipReason> {
        let charities = context
            .resolve_all(EntityKind::Charity, record.ordered_ids("charity_id"))
            .into_iter()
            .map(EntitySummary::of)
            .collect();

        let brands = context
            .resolve_all(EntityKind::Brand, record.ref_ids("brand"))
            .into_iter()
            .map(|brand| Self::brand_summary(brand, context))
            .collect();

        let episodes: Vec<EpisodeSummary> = context
            .records(EntityKind::Episode)
            .filter(|episode| episode.ref_id("series_id").as_deref() == Some(record.id.as_str()))
            .map(EpisodeSummary::of)
            .collect();

        Ok(IndexDocument::Series(SeriesDocument {
            base: DocumentBase::from_record(EntityKind::Series, record, &["brand"]),
            charities,
            brands,
            episodes: episodes.into(),
        }))
    }
}
