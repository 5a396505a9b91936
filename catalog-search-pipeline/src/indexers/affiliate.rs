use catalog_search_shared::{
    AffiliateDocument, DocumentBase, EntityKind, IndexDocument, SourceKind, SourceRecord,
};

use super::DocumentBuilder;
use crate::entity_map::JoinContext;
use crate::report::SkipReason;

/// Tag of the picture shown at the end of an affiliate spot.
const END_IMAGE_TAG: &str = "end";

pub struct AffiliateBuilder;

impl DocumentBuilder for AffiliateBuilder {
    fn kind(&self) -> EntityKind {
        EntityKind::Affiliate
    }

    fn auxiliary(&self) -> &'static [SourceKind] {
        &[]
    }

    fn build(
        &self,
        record: &SourceRecord,
        _context: &JoinContext,
    ) -> Result<IndexDocument, SkipReason> {
        Ok(IndexDocument::Affiliate(AffiliateDocument {
            base: DocumentBase::from_record(EntityKind::Affiliate, record, &[]),
            end_image: record.picture(END_IMAGE_TAG).cloned(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_search_shared::Picture;

    #[test]
    fn test_affiliate_picks_end_image() {
        let record = SourceRecord::new(EntityKind::Affiliate, "a1")
            .with_picture(Picture::new("start", "https://img/start.png"))
            .with_picture(Picture::new("end", "https://img/end.png"));

        let IndexDocument::Affiliate(doc) = AffiliateBuilder.build(&record, &JoinContext::new()).unwrap()
        else {
            panic!("expected an affiliate document");
        };

        assert_eq!(doc.end_image, Some(Picture::new("end", "https://img/end.png")));
        assert_eq!(doc.base.pictures.len(), 2);

        let record = SourceRecord::new(EntityKind::Affiliate, "a2");
        let IndexDocument::Affiliate(doc) = AffiliateBuilder.build(&record, &JoinContext::new()).unwrap()
        else {
            panic!("expected an affiliate document");
        };
        assert!(doc.end_image.is_none());
    }
}
