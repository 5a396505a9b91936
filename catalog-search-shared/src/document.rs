//! Denormalized documents written to the search store.
//!
//! Every document carries the source `id` as its store-level key. Relation
//! fields of the source record are replaced by embedded summaries resolved
//! one level deep.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::kind::EntityKind;
use crate::record::{Picture, SourceRecord};

/// The `{id, title, slug}` shape embedded for a resolved relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySummary {
    pub id: String,
    pub title: Option<String>,
    pub slug: Option<String>,
}

impl EntitySummary {
    pub fn of(record: &SourceRecord) -> Self {
        Self {
            id: record.id.clone(),
            title: record.title.clone(),
            slug: record.slug.clone(),
        }
    }
}

/// An episode as embedded in star, category, series and carousel documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    #[serde(flatten)]
    pub summary: EntitySummary,
    pub picture: Option<Picture>,
}

impl EpisodeSummary {
    pub fn of(record: &SourceRecord) -> Self {
        Self {
            summary: EntitySummary::of(record),
            picture: record.pictures.first().cloned(),
        }
    }
}

/// A brand with its offers resolved, as nested in series and offer documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandSummary {
    #[serde(flatten)]
    pub summary: EntitySummary,
    #[serde(default)]
    pub offers: Vec<EntitySummary>,
}

/// A video source resolved for an episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSummary {
    pub id: String,
    pub url: Option<String>,
    pub thumbnail: Option<String>,
}

/// A relation list that reports its size alongside the items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedList<T> {
    pub total: usize,
    pub items: Vec<T>,
}

impl<T> From<Vec<T>> for RelatedList<T> {
    fn from(items: Vec<T>) -> Self {
        Self {
            total: items.len(),
            items,
        }
    }
}

/// Fields every indexed document shares.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentBase {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EntityKind,
    pub title: Option<String>,
    pub slug: Option<String>,
    pub pictures: Vec<Picture>,
    pub environments: Vec<String>,
    pub indexed_at: DateTime<Utc>,
    /// Free-form source fields that were not consumed by a relation join.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl DocumentBase {
    /// Copy the shared fields of `record`, leaving out `consumed` attributes.
    ///
    /// Indexers pass the raw relation fields they replace with summaries.
    /// Fields named like a typed document field of any kind are never copied:
    /// every kind shares one index, so a free-form `video` list on a brand
    /// would clash with the `video` object of an episode.
    pub fn from_record(kind: EntityKind, record: &SourceRecord, consumed: &[&str]) -> Self {
        let attributes = record
            .fields
            .iter()
            .filter(|(name, _)| !consumed.contains(&name.as_str()))
            .filter(|(name, _)| !is_typed_field(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        Self {
            id: record.id.clone(),
            kind,
            title: record.title.clone(),
            slug: record.slug.clone(),
            pictures: record.pictures.clone(),
            environments: record.environments.iter().cloned().collect(),
            indexed_at: Utc::now(),
            attributes,
        }
    }
}

/// Fields of [`DocumentBase`] itself.
const BASE_FIELDS: [&str; 7] = [
    "id",
    "type",
    "title",
    "slug",
    "pictures",
    "environments",
    "indexed_at",
];

/// Relation fields the per-kind documents add on top of [`DocumentBase`].
pub const RELATION_FIELDS: [&str; 11] = [
    "offers",
    "thumbnail",
    "episodes",
    "series",
    "brands",
    "charities",
    "stars",
    "categoryIds",
    "video",
    "brand",
    "end_image",
];

/// Whether `name` is a field some document writes with a fixed shape.
pub fn is_typed_field(name: &str) -> bool {
    BASE_FIELDS.contains(&name) || RELATION_FIELDS.contains(&name)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrandDocument {
    #[serde(flatten)]
    pub base: DocumentBase,
    pub offers: Vec<EntitySummary>,
    /// First thumbnail frame of the brand's first linked video.
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StarDocument {
    #[serde(flatten)]
    pub base: DocumentBase,
    pub episodes: Vec<EpisodeSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CharityDocument {
    #[serde(flatten)]
    pub base: DocumentBase,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryDocument {
    #[serde(flatten)]
    pub base: DocumentBase,
    pub episodes: RelatedList<EpisodeSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeDocument {
    #[serde(flatten)]
    pub base: DocumentBase,
    pub series: Option<EntitySummary>,
    /// Brands of the episode's series.
    pub brands: Vec<EntitySummary>,
    /// Charities of the episode's series.
    pub charities: Vec<EntitySummary>,
    pub stars: Vec<EntitySummary>,
    /// Category IDs, resolved to full categories at lookup time.
    #[serde(rename = "categoryIds")]
    pub category_ids: Vec<String>,
    pub video: Option<VideoSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesDocument {
    #[serde(flatten)]
    pub base: DocumentBase,
    pub charities: Vec<EntitySummary>,
    pub brands: Vec<BrandSummary>,
    pub episodes: RelatedList<EpisodeSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OfferDocument {
    #[serde(flatten)]
    pub base: DocumentBase,
    pub brand: BrandSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarouselDocument {
    #[serde(flatten)]
    pub base: DocumentBase,
    pub episodes: Vec<EpisodeSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AffiliateDocument {
    #[serde(flatten)]
    pub base: DocumentBase,
    pub end_image: Option<Picture>,
}

/// A document ready to be written to the search store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum IndexDocument {
    Brand(BrandDocument),
    Star(StarDocument),
    Charity(CharityDocument),
    Category(CategoryDocument),
    Episode(EpisodeDocument),
    Series(SeriesDocument),
    Offer(OfferDocument),
    Carousel(CarouselDocument),
    Affiliate(AffiliateDocument),
}

impl IndexDocument {
    pub fn base(&self) -> &DocumentBase {
        match self {
            IndexDocument::Brand(doc) => &doc.base,
            IndexDocument::Star(doc) => &doc.base,
            IndexDocument::Charity(doc) => &doc.base,
            IndexDocument::Category(doc) => &doc.base,
            IndexDocument::Episode(doc) => &doc.base,
            IndexDocument::Series(doc) => &doc.base,
            IndexDocument::Offer(doc) => &doc.base,
            IndexDocument::Carousel(doc) => &doc.base,
            IndexDocument::Affiliate(doc) => &doc.base,
        }
    }

    pub fn id(&self) -> &str {
        &self.base().id
    }

    pub fn kind(&self) -> EntityKind {
        self.base().kind
    }

    /// Serialize into the JSON body sent to the store.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn episode_record() -> SourceRecord {
        SourceRecord::new(EntityKind::Episode, "e1")
            .with_title("Pilot")
            .with_slug("pilot")
            .in_environment("production")
            .with_picture(Picture::new("cover", "https://img/e1.jpg"))
            .with_field("series_id", json!("s1"))
            .with_field("duration", json!(42))
            .with_field("type", json!("legacy"))
    }

    #[test]
    fn test_base_drops_consumed_and_reserved_fields() {
        let base = DocumentBase::from_record(EntityKind::Episode, &episode_record(), &["series_id"]);

        assert_eq!(base.id, "e1");
        assert_eq!(base.environments, vec!["production".to_string()]);
        assert_eq!(base.attributes.len(), 1);
        assert_eq!(base.attributes["duration"], json!(42));
    }

    #[test]
    fn test_base_never_copies_typed_field_names() {
        let record = SourceRecord::new(EntityKind::Brand, "b1")
            .with_field("video", json!(["v1"]))
            .with_field("brand", json!("b0"))
            .with_field("episodes", json!(["e1"]))
            .with_field("rating", json!(5));

        let base = DocumentBase::from_record(EntityKind::Brand, &record, &[]);

        assert_eq!(base.attributes.len(), 1);
        assert_eq!(base.attributes["rating"], json!(5));
    }

    #[test]
    fn test_document_serializes_flat() {
        let record = episode_record();
        let doc = IndexDocument::Episode(EpisodeDocument {
            base: DocumentBase::from_record(EntityKind::Episode, &record, &["series_id"]),
            series: Some(EntitySummary {
                id: "s1".to_string(),
                title: Some("Season".to_string()),
                slug: None,
            }),
            brands: vec![],
            charities: vec![],
            stars: vec![],
            category_ids: vec!["c1".to_string()],
            video: None,
        });

        let value = doc.to_value().unwrap();

        assert_eq!(doc.id(), "e1");
        assert_eq!(doc.kind(), EntityKind::Episode);
        assert_eq!(value["id"], "e1");
        assert_eq!(value["type"], "episode");
        assert_eq!(value["series"]["id"], "s1");
        assert_eq!(value["categoryIds"], json!(["c1"]));
        assert_eq!(value["duration"], 42);
        assert!(value.get("series_id").is_none());
    }

    #[test]
    fn test_related_list_counts_items() {
        let list: RelatedList<EpisodeSummary> =
            vec![EpisodeSummary::of(&episode_record())].into();
        assert_eq!(list.total, 1);
        assert_eq!(list.items[0].picture.as_ref().unwrap().tag, "cover");
    }
}
