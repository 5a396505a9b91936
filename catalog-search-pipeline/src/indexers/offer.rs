use catalog_search_shared::{
    BrandSummary, DocumentBase, EntityKind, EntitySummary, IndexDocument, OfferDocument,
    SourceKind, SourceRecord,
};

use super::DocumentBuilder;
use crate::entity_map::JoinContext;
use crate::report::SkipReason;

/// Offers embed the brand that lists them. An offer no brand lists is not
/// searchable and produces no document.
pub struct OfferBuilder;

impl DocumentBuilder for OfferBuilder {
    fn kind(&self) -> EntityKind {
        EntityKind::Offer
    }

    fn auxiliary(&self) -> &'static [SourceKind] {
        &[
            SourceKind::Entity(EntityKind::Brand),
            SourceKind::Entity(EntityKind::Offer),
        ]
    }

    fn build(
        &self,
        record: &SourceRecord,
        context: &JoinContext,
    ) -> Result<IndexDocument, SkipReason> {
        let brand = context
            .records(EntityKind::Brand)
            .find(|brand| brand.references("offer", &record.id))
            .ok_or_else(|| SkipReason::relation_unresolved("brand"))?;

        let offers = context
            .resolve_all(EntityKind::Offer, brand.ref_ids("offer"))
            .into_iter()
            .map(EntitySummary::of)
            .collect();

        Ok(IndexDocument::Offer(OfferDocument {
            base: DocumentBase::from_record(EntityKind::Offer, record, &[]),
            brand: BrandSummary {
                summary: EntitySummary::of(brand),
                offers,
            },
        }))
    }
}
