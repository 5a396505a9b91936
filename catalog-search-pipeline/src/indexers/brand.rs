use catalog_search_shared::{
    BrandDocument, DocumentBase, EntityKind, EntitySummary, IndexDocument, SourceKind,
    SourceRecord,
};

use super::DocumentBuilder;
use crate::entity_map::JoinContext;
use crate::report::SkipReason;

/// Brands embed their offers and a thumbnail taken from their first video.
pub struct BrandBuilder;

impl BrandBuilder {
    /// First thumbnail frame of the brand's first linked video.
    fn thumbnail(record: &SourceRecord, context: &JoinContext) -> Option<String> {
        let video_id = record.ref_id("video")?;
        context
            .resolve(SourceKind::Video, &video_id)?
            .ref_id("thumbnails")
    }
}

impl DocumentBuilder for BrandBuilder {
    fn kind(&self) -> EntityKind {
        EntityKind::Brand
    }

    fn auxiliary(&self) -> &'static [SourceKind] {
        &[SourceKind::Entity(EntityKind::Offer), SourceKind::Video]
    }

    fn build(
        &self,
        record: &SourceRecord,
        context: &JoinContext,
    ) -> Result<IndexDocument, SkipReason> {
        let offers = context
            .resolve_all(EntityKind::Offer, &record.ref_ids("offer"))
            .into_iter()
            .map(EntitySummary::of)
            .collect();

        Ok(IndexDocument::Brand(BrandDocument {
            base: DocumentBase::from_record(EntityKind::Brand, record, &["offer", "video"]),
            offers,
            thumbnail: Self::thumbnail(record, context),
        }))
    }
}
