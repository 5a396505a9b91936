//! OpenSearch index configuration and mappings.
//!
//! All document kinds share one index. The `type` keyword separates them and
//! the store-level document ID is `{type}_{id}`.

use serde_json::{json, Value};

/// Default name of the catalog index.
pub const DEFAULT_INDEX_NAME: &str = "catalog";

/// Connection-independent settings for the catalog index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexConfig {
    /// Index (or alias) holding every document kind.
    pub alias: String,
    /// Page size used when listing stored IDs for stale detection.
    pub scan_page_size: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            alias: DEFAULT_INDEX_NAME.to_string(),
            scan_page_size: 1000,
        }
    }
}

impl IndexConfig {
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            ..Self::default()
        }
    }
}

/// Get the index settings and mappings for the catalog index.
///
/// Only the fields the query layer relies on are mapped explicitly; the rest
/// of each document is mapped dynamically.
///
/// - **Keyword fields**: `type`, `id`, `slug`, `environments` for filtering,
///   exact ID lookups and `search_after` paging
/// - **Text fields**: `title` and `name`, each with a `raw` keyword sub-field
///   for sorting
pub fn get_index_settings() -> Value {
    json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 1
        },
        "mappings": {
            "properties": {
                "type": {
                    "type": "keyword"
                },
                "id": {
                    "type": "keyword"
                },
                "slug": {
                    "type": "keyword"
                },
                "environments": {
                    "type": "keyword"
                },
                "title": {
                    "type": "text",
                    "fields": {
                        "raw": {
                            "type": "keyword"
                        }
                    }
                },
                "name": {
                    "type": "text",
                    "fields": {
                        "raw": {
                            "type": "keyword"
                        }
                    }
                },
                "indexed_at": {
                    "type": "date"
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_settings_structure() {
        let settings = get_index_settings();

        assert!(settings["settings"]["number_of_shards"].is_number());
        assert!(settings["settings"]["number_of_replicas"].is_number());

        let properties = &settings["mappings"]["properties"];
        assert_eq!(properties["type"]["type"], "keyword");
        assert_eq!(properties["id"]["type"], "keyword");
        assert_eq!(properties["environments"]["type"], "keyword");
        assert_eq!(properties["title"]["type"], "text");
        assert_eq!(properties["title"]["fields"]["raw"]["type"], "keyword");
        assert_eq!(properties["name"]["type"], "text");
    }

    #[test]
    fn test_default_config() {
        let config = IndexConfig::default();
        assert_eq!(config.alias, DEFAULT_INDEX_NAME);
        assert_eq!(IndexConfig::new("catalog-v2").alias, "catalog-v2");
    }
}
