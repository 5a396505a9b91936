use catalog_search_shared::{
    DocumentBase, EntityKind, EntitySummary, EpisodeDocument, IndexDocument, SourceKind,
    SourceRecord, VideoSummary,
};

use super::{episode_star_ids, DocumentBuilder};
use crate::entity_map::JoinContext;
use crate::report::SkipReason;

/// Raw relation fields the episode document replaces with summaries.
const CONSUMED: [&str; 4] = ["series_id", "star_id", "category", "video"];

/// Episodes embed their series, the series' brands and charities, their
/// stars and their video. Categories stay as IDs.
pub struct EpisodeBuilder;

impl EpisodeBuilder {
    fn video(record: &SourceRecord, context: &JoinContext) -> Option<VideoSummary> {
        let video = context.resolve(SourceKind::Video, &record.ref_id("video")?)?;
        Some(VideoSummary {
            id: video.id.clone(),
            url: video.str_field("url").map(String::from),
            thumbnail: video.ref_id("thumbnails"),
        })
    }
}

impl DocumentBuilder for EpisodeBuilder {
    fn kind(&self) -> EntityKind {
        EntityKind::Episode
    }

    fn auxiliary(&self) -> &'static [SourceKind] {
        &[
            SourceKind::Entity(EntityKind::Series),
            SourceKind::Entity(EntityKind::Star),
            SourceKind::Entity(EntityKind::Brand),
            SourceKind::Entity(EntityKind::Charity),
            SourceKind::Video,
        ]
    }

    fn build(
        &self,
        record: &SourceRecord,
        context: &JoinContext,
    ) -> Result<IndexDocument, SkipReason> {
        let series = record
            .ref_id("series_id")
            .and_then(|id| context.resolve(EntityKind::Series, &id));

        let (brands, charities) = match series {
            Some(series) => (
                context
                    .resolve_all(EntityKind::Brand, series.ref_ids("brand"))
                    .into_iter()
                    .map(EntitySummary::of)
                    .collect(),
                context
                    .resolve_all(EntityKind::Charity, series.ordered_ids("charity_id"))
                    .into_iter()
                    .map(EntitySummary::of)
                    .collect(),
            ),
            None => (Vec::new(), Vec::new()),
        };

        let stars = context
            .resolve_all(EntityKind::Star, episode_star_ids(record))
            .into_iter()
            .map(EntitySummary::of)
            .collect();

        Ok(IndexDocument::Episode(EpisodeDocument {
            base: DocumentBase::from_record(EntityKind::Episode, record, &CONSUMED),
            series: series.map(EntitySummary::of),
            brands,
            charities,
            stars,
            category_ids: record.ref_ids("category"),
            video: Self::video(record, context),
        }))
    }
}
