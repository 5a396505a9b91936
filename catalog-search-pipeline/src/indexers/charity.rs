use catalog_search_shared::{
    CharityDocument, DocumentBase, EntityKind, IndexDocument, SourceKind, SourceRecord,
};

use super::DocumentBuilder;
use crate::entity_map::JoinContext;
use crate::report::SkipReason;

/// Charities are indexed as fetched.
pub struct CharityBuilder;

impl DocumentBuilder for CharityBuilder {
    fn kind(&self) -> EntityKind {
        EntityKind::Charity
    }

    fn auxiliary(&self) -> &'static [SourceKind] {
        &[]
    }

    fn build(
        &self,
        record: &SourceRecord,
        _context: &JoinContext,
    ) -> Result<IndexDocument, SkipReason> {
        Ok(IndexDocument::Charity(CharityDocument {
            base: DocumentBase::from_record(EntityKind::Charity, record, &[]),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_charity_copies_attributes() {
        let record = SourceRecord::new(EntityKind::Charity, "c1")
            .with_title("Clean Water")
            .in_environment("production")
            .with_field("registration", json!("12345"));

        let document = CharityBuilder.build(&record, &JoinContext::new()).unwrap();
        let value = document.to_value().unwrap();

        assert_eq!(value["id"], "c1");
        assert_eq!(value["type"], "charity");
        assert_eq!(value["title"], "Clean Water");
        assert_eq!(value["environments"], json!(["production"]));
        assert_eq!(value["registration"], "12345");
    }
}
