use catalog_search_shared::{
    DocumentBase, EntityKind, EpisodeSummary, IndexDocument, SourceKind, SourceRecord,
    StarDocument,
};

use super::{episode_star_ids, DocumentBuilder};
use crate::entity_map::JoinContext;
use crate::report::SkipReason;

/// Most episodes embedded in a star document.
pub const MAX_STAR_EPISODES: usize = 5;

/// Stars embed the first episodes they appear in.
pub struct StarBuilder;

impl DocumentBuilder for StarBuilder {
    fn kind(&self) -> EntityKind {
        EntityKind::Star
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
            .records(EntityKind::Episode)
            .filter(|episode| episode_star_ids(episode).contains(&record.id))
            .take(MAX_STAR_EPISODES)
            .map(EpisodeSummary::of)
            .collect();

        Ok(IndexDocument::Star(StarDocument {
            base: DocumentBase::from_record(EntityKind::Star, record, &[]),
            episodes,
        }))
    }
}
