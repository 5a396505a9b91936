//! Query and response types for reading documents back out of the store.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::kind::EntityKind;

/// Page size used when the caller does not pass one.
pub const DEFAULT_LIMIT: usize = 10;

/// A caller-supplied full-text clause restricted to some fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldFilter {
    pub fields: Vec<String>,
    pub query: String,
}

impl FieldFilter {
    pub fn new<I, S>(fields: I, query: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            query: query.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortField {
    pub field: String,
    pub order: SortOrder,
}

impl SortField {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Desc,
        }
    }

    /// Parse `field`, `field:asc` or `field:desc`.
    pub fn parse(raw: &str) -> Option<Self> {
        let (field, order) = match raw.split_once(':') {
            Some((field, "asc")) => (field, SortOrder::Asc),
            Some((field, "desc")) => (field, SortOrder::Desc),
            Some(_) => return None,
            None => (raw, SortOrder::Asc),
        };
        if field.is_empty() {
            return None;
        }
        Some(Self {
            field: field.to_string(),
            order,
        })
    }
}

/// Search parameters.
///
/// The store is schema-less, so `types` holds raw type tags rather than
/// [`EntityKind`]s; this lets callers ask for documents written by other
/// producers (such as `news`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Free text matched as word prefixes against `name` and `title`.
    pub term: Option<String>,
    /// Additional full-text clauses.
    pub filters: Vec<FieldFilter>,
    /// Fields that must be present on every hit.
    pub exists: Vec<String>,
    /// Restrict hits to these document IDs.
    pub ids: Vec<String>,
    /// Type tags to search.
    pub types: Vec<String>,
    pub offset: usize,
    pub limit: usize,
    pub sort: Vec<SortField>,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            term: None,
            filters: Vec::new(),
            exists: Vec::new(),
            ids: Vec::new(),
            types: EntityKind::DEFAULT_SEARCH
                .iter()
                .map(|kind| kind.as_str().to_string())
                .collect(),
            offset: 0,
            limit: DEFAULT_LIMIT,
            sort: Vec::new(),
        }
    }
}

impl SearchQuery {
    /// A free-text query over the default types.
    pub fn text(term: impl Into<String>) -> Self {
        Self {
            term: Some(term.into()),
            ..Self::default()
        }
    }

    /// Match every document of one kind.
    pub fn for_kind(kind: EntityKind) -> Self {
        Self::default().with_types([kind.as_str()])
    }

    pub fn with_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_filter(mut self, filter: FieldFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_exists(mut self, field: impl Into<String>) -> Self {
        self.exists.push(field.into());
        self
    }

    pub fn with_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_page(mut self, offset: usize, limit: usize) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }

    pub fn with_sort(mut self, sort: SortField) -> Self {
        self.sort.push(sort);
        self
    }

    /// The free-text term, if it is non-blank.
    pub fn text_term(&self) -> Option<&str> {
        self.term.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

/// One document returned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// The document's type tag.
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    pub source: Value,
}

/// A page of hits with the total number of matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub total: u64,
    pub hits: Vec<SearchHit>,
}

impl SearchResponse {
    pub fn empty() -> Self {
        Self::default()
    }
}
