//! Grouping of heterogeneous hits by type.

use serde::Serialize;
use serde_json::Value;

use catalog_search_shared::SearchHit;

/// Hits of one query grouped per type. A group is present only when it has
/// at least one hit.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResults {
    pub total: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brands: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stars: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charities: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offers: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episodes: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carousels: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affiliates: Option<Vec<Value>>,
    /// News items live in the store but are written by another system.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub news: Option<Vec<Value>>,
}

impl SearchResults {
    fn group_mut(&mut self, kind: &str) -> Option<&mut Option<Vec<Value>>> {
        let group = match kind {
            "brand" => &mut self.brands,
            "star" => &mut self.stars,
            "charity" => &mut self.charities,
            "offer" => &mut self.offers,
            "episode" => &mut self.episodes,
            "category" => &mut self.categories,
            "series" => &mut self.series,
            "carousel" => &mut self.carousels,
            "affiliate" => &mut self.affiliates,
            "news" => &mut self.news,
            _ => return None,
        };
        Some(group)
    }
}

/// Group `hits` by their type tag. Hits of an unknown type are dropped.
pub fn partition(total: u64, hits: Vec<SearchHit>) -> SearchResults {
    let mut results = SearchResults {
        total,
        ..SearchResults::default()
    };

    for hit in hits {
        if let Some(group) = results.group_mut(&hit.kind) {
            group.get_or_insert_with(Vec::new).push(hit.source);
        }
    }

    results
}

/// The payload of the first hit of type `kind`, if any.
pub fn single(kind: &str, hits: Vec<SearchHit>) -> Option<Value> {
    hits.into_iter()
        .find(|hit| hit.kind == kind)
        .map(|hit| hit.source)
}
