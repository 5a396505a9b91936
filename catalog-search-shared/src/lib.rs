//! # Catalog Search Shared
//!
//! Types shared by the catalog search crates: the entity kinds the content
//! source serves, the source records fetched from it, the denormalized
//! documents written to the search store, and the query/response shapes
//! used to read them back.

pub mod document;
pub mod kind;
pub mod record;
pub mod search;

pub use document::{
    AffiliateDocument, BrandDocument, BrandSummary, CarouselDocument, CategoryDocument,
    CharityDocument, DocumentBase, EntitySummary, EpisodeDocument, EpisodeSummary,
    IndexDocument, OfferDocument, RelatedList, SeriesDocument, StarDocument, VideoSummary,
    is_typed_field, RELATION_FIELDS,
};
pub use kind::{EntityKind, SourceKind, UnknownKind};
pub use record::{
    decode_ordered_refs, MalformedRecord, OrderedRef, Picture, RecordError, SourceRecord,
};
pub use search::{
    FieldFilter, SearchHit, SearchQuery, SearchResponse, SortField, SortOrder, DEFAULT_LIMIT,
};
