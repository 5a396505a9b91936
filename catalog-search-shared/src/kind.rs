//! Entity kinds.
//!
//! `EntityKind` is the closed set of nine kinds that get indexed. `SourceKind`
//! widens it with the auxiliary collections the content source serves purely
//! for relation resolution.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Returned when a string does not name a known kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown entity kind: {0}")]
pub struct UnknownKind(pub String);

/// A kind of catalog entity that is indexed into the search store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Brand,
    Star,
    Charity,
    Category,
    Episode,
    Series,
    Offer,
    Carousel,
    Affiliate,
}

impl EntityKind {
    /// Every indexed kind.
    pub const ALL: [EntityKind; 9] = [
        EntityKind::Brand,
        EntityKind::Star,
        EntityKind::Charity,
        EntityKind::Category,
        EntityKind::Episode,
        EntityKind::Series,
        EntityKind::Offer,
        EntityKind::Carousel,
        EntityKind::Affiliate,
    ];

    /// Kinds a query spans when the caller names none. Affiliates are only
    /// returned when asked for explicitly.
    pub const DEFAULT_SEARCH: [EntityKind; 8] = [
        EntityKind::Brand,
        EntityKind::Star,
        EntityKind::Charity,
        EntityKind::Category,
        EntityKind::Episode,
        EntityKind::Series,
        EntityKind::Offer,
        EntityKind::Carousel,
    ];

    /// The type tag used by the content source and the search store.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Brand => "brand",
            EntityKind::Star => "star",
            EntityKind::Charity => "charity",
            EntityKind::Category => "category",
            EntityKind::Episode => "episode",
            EntityKind::Series => "series",
            EntityKind::Offer => "offer",
            EntityKind::Carousel => "carousel",
            EntityKind::Affiliate => "affiliate",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

/// A collection served by the content source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceKind {
    /// An indexed entity collection.
    Entity(EntityKind),
    /// Video sources, fetched only to resolve thumbnails and playback URLs.
    Video,
}

impl SourceKind {
    /// Path segment of the collection on the content API.
    pub fn collection(&self) -> &'static str {
        match self {
            SourceKind::Entity(kind) => kind.as_str(),
            SourceKind::Video => "video",
        }
    }

    /// Relation fields holding `"<id>-<order>"` references for this collection.
    ///
    /// These are decoded into [`crate::OrderedRef`] pairs when a record is
    /// ingested so indexers never see the composite string form.
    pub fn ordered_relation_fields(&self) -> &'static [&'static str] {
        match self {
            SourceKind::Entity(EntityKind::Episode) => &["star"],
            SourceKind::Entity(EntityKind::Series) => &["charity_id"],
            SourceKind::Entity(EntityKind::Carousel) => &["episodes"],
            _ => &[],
        }
    }
}

impl From<EntityKind> for SourceKind {
    fn from(kind: EntityKind) -> Self {
        SourceKind::Entity(kind)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection())
    }
}
