//! Source records as fetched from the content API.
//!
//! A record is decoded once at ingestion. Well-known attributes get typed
//! fields; everything else stays in a free-form JSON map that indexers read
//! relation IDs from and that is copied verbatim into the indexed document.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::kind::SourceKind;

/// Errors raised while decoding a raw record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// The payload was not a JSON object.
    #[error("Record is not a JSON object")]
    NotAnObject,

    /// The payload had no usable `id`.
    #[error("Record has no id")]
    MissingId,

    /// A well-known field had an unexpected shape.
    #[error("Invalid field {field}: {message}")]
    InvalidField { field: String, message: String },
}

/// A raw payload that failed to decode, with whatever identity it carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedRecord {
    pub id: Option<String>,
    pub environments: BTreeSet<String>,
    pub error: RecordError,
}

impl MalformedRecord {
    pub fn is_in_environment(&self, environment: &str) -> bool {
        self.environments.contains(environment)
    }
}

/// A relation ID paired with the sort order it was tagged with.
///
/// The content source encodes these as `"<id>-<order>"`. A value without a
/// numeric suffix decodes to the whole string with order `0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderedRef {
    pub id: String,
    pub order: u32,
}

impl OrderedRef {
    /// Create a reference from its parts.
    pub fn new(id: impl Into<String>, order: u32) -> Self {
        Self {
            id: id.into(),
            order,
        }
    }

    /// Decode a composite `"<id>-<order>"` string.
    pub fn parse(raw: &str) -> Self {
        if let Some((id, suffix)) = raw.rsplit_once('-') {
            if !id.is_empty() && !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit())
            {
                if let Ok(order) = suffix.parse::<u32>() {
                    return Self::new(id, order);
                }
            }
        }
        Self::new(raw, 0)
    }
}

/// Sort references ascending by order and return the bare IDs.
///
/// The sort is stable, so references sharing an order keep fetch order.
pub fn sorted_ids(refs: &[OrderedRef]) -> Vec<String> {
    let mut sorted: Vec<&OrderedRef> = refs.iter().collect();
    sorted.sort_by_key(|r| r.order);
    sorted.into_iter().map(|r| r.id.clone()).collect()
}

/// Decode composite `"<id>-<order>"` strings into IDs sorted by order.
pub fn decode_ordered_refs<S: AsRef<str>>(refs: &[S]) -> Vec<String> {
    let parsed: Vec<OrderedRef> = refs.iter().map(|r| OrderedRef::parse(r.as_ref())).collect();
    sorted_ids(&parsed)
}

/// A tagged image attached to a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Picture {
    #[serde(alias = "type", default)]
    pub tag: String,
    #[serde(alias = "src")]
    pub url: String,
}

impl Picture {
    pub fn new(tag: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            url: url.into(),
        }
    }
}

/// A remote entity instance. Immutable once fetched for an indexing run.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    pub id: String,
    pub kind: SourceKind,
    pub environments: BTreeSet<String>,
    pub title: Option<String>,
    pub slug: Option<String>,
    pub pictures: Vec<Picture>,
    /// Ordered relation fields, decoded from their composite string form.
    pub ordered: BTreeMap<String, Vec<OrderedRef>>,
    /// Remaining type-specific fields, including raw relation IDs.
    pub fields: Map<String, Value>,
}

impl SourceRecord {
    /// Create an empty record. Mostly useful for building fixtures.
    pub fn new(kind: impl Into<SourceKind>, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            environments: BTreeSet::new(),
            title: None,
            slug: None,
            pictures: Vec::new(),
            ordered: BTreeMap::new(),
            fields: Map::new(),
        }
    }

    /// Decode a raw JSON payload fetched from the `kind` collection.
    pub fn from_json(kind: SourceKind, raw: Value) -> Result<Self, RecordError> {
        let Value::Object(mut fields) = raw else {
            return Err(RecordError::NotAnObject);
        };

        let id = fields
            .remove("id")
            .as_ref()
            .and_then(scalar_to_string)
            .filter(|id| !id.is_empty())
            .ok_or(RecordError::MissingId)?;

        // The collection is authoritative for the kind.
        fields.remove("type");

        let environments = fields
            .remove("environments")
            .map(|v| strings(&v))
            .unwrap_or_default()
            .into_iter()
            .collect();

        let title = match fields.remove("title") {
            Some(value) => scalar_to_string(&value),
            None => fields.get("name").and_then(scalar_to_string),
        };
        let slug = fields.remove("slug").as_ref().and_then(scalar_to_string);

        let pictures = match fields.remove("pictures") {
            None | Some(Value::Null) => Vec::new(),
            Some(value) => {
                serde_json::from_value(value).map_err(|e| RecordError::InvalidField {
                    field: "pictures".to_string(),
                    message: e.to_string(),
                })?
            }
        };

        let mut ordered = BTreeMap::new();
        for field in kind.ordered_relation_fields() {
            if let Some(value) = fields.remove(*field) {
                let refs = strings(&value)
                    .iter()
                    .map(|raw| OrderedRef::parse(raw))
                    .collect();
                ordered.insert(field.to_string(), refs);
            }
        }

        Ok(Self {
            id,
            kind,
            environments,
            title,
            slug,
            pictures,
            ordered,
            fields,
        })
    }

    /// Decode `raw` like [`SourceRecord::from_json`], keeping the `id` and
    /// `environments` of a payload that fails so it can still be reported.
    pub fn decode(kind: SourceKind, raw: Value) -> Result<Self, MalformedRecord> {
        let id = raw
            .get("id")
            .and_then(scalar_to_string)
            .filter(|id| !id.is_empty());
        let environments = raw
            .get("environments")
            .map(strings)
            .unwrap_or_default()
            .into_iter()
            .collect();

        Self::from_json(kind, raw).map_err(|error| MalformedRecord {
            id,
            environments,
            error,
        })
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn in_environment(mut self, environment: impl Into<String>) -> Self {
        self.environments.insert(environment.into());
        self
    }

    pub fn with_picture(mut self, picture: Picture) -> Self {
        self.pictures.push(picture);
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn with_ordered(mut self, name: impl Into<String>, refs: Vec<OrderedRef>) -> Self {
        self.ordered.insert(name.into(), refs);
        self
    }

    /// Whether the record is tagged with `environment`.
    pub fn is_in_environment(&self, environment: &str) -> bool {
        self.environments.contains(environment)
    }

    /// A single foreign ID. For list-valued fields this is the first entry.
    pub fn ref_id(&self, field: &str) -> Option<String> {
        match self.fields.get(field)? {
            Value::Array(items) => items.iter().find_map(scalar_to_string),
            value => scalar_to_string(value),
        }
    }

    /// All foreign IDs held by a field. A scalar is treated as a one-item list.
    pub fn ref_ids(&self, field: &str) -> Vec<String> {
        self.fields.get(field).map(strings).unwrap_or_default()
    }

    /// Whether a list-valued relation field contains `id`.
    pub fn references(&self, field: &str, id: &str) -> bool {
        self.ref_ids(field).iter().any(|candidate| candidate == id)
    }

    /// IDs of an ordered relation field, ascending by order.
    pub fn ordered_ids(&self, field: &str) -> Vec<String> {
        self.ordered
            .get(field)
            .map(|refs| sorted_ids(refs))
            .unwrap_or_default()
    }

    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// The first picture carrying `tag`.
    pub fn picture(&self, tag: &str) -> Option<&Picture> {
        self.pictures.iter().find(|p| p.tag == tag)
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn strings(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(scalar_to_string).collect(),
        Value::Null => Vec::new(),
        other => scalar_to_string(other).into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::EntityKind;
    use serde_json::json;

    #[test]
    fn test_decode_ordered_refs_sorts_by_suffix() {
        assert_eq!(decode_ordered_refs(&["b-2", "a-1", "c-0"]), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_decode_ordered_refs_defaults_missing_suffix_to_zero() {
        assert_eq!(decode_ordered_refs(&["x"]), vec!["x"]);
        assert_eq!(decode_ordered_refs(&["y-1", "x"]), vec!["x", "y"]);
    }

    #[test]
    fn test_decode_ordered_refs_is_stable() {
        assert_eq!(
            decode_ordered_refs(&["b-1", "a-1", "c-0", "d"]),
            vec!["c", "d", "b", "a"]
        );
    }

    #[test]
    fn test_parse_non_numeric_suffix() {
        assert_eq!(OrderedRef::parse("red-shoes"), OrderedRef::new("red-shoes", 0));
        assert_eq!(OrderedRef::parse("-3"), OrderedRef::new("-3", 0));
        assert_eq!(OrderedRef::parse("42-"), OrderedRef::new("42-", 0));
        assert_eq!(OrderedRef::parse("a-b-7"), OrderedRef::new("a-b", 7));
    }

    #[test]
    fn test_from_json_extracts_well_known_fields() {
        let raw = json!({
            "id": 12,
            "type": "episode",
            "environments": ["production", "staging"],
            "title": "Pilot",
            "slug": "pilot",
            "pictures": [{"type": "cover", "url": "https://img/1.jpg"}],
            "star": ["s2-1", "s1-0"],
            "series_id": "7",
            "duration": 42
        });

        let record = SourceRecord::from_json(EntityKind::Episode.into(), raw).unwrap();

        assert_eq!(record.id, "12");
        assert!(record.is_in_environment("production"));
        assert!(!record.is_in_environment("preview"));
        assert_eq!(record.title.as_deref(), Some("Pilot"));
        assert_eq!(record.slug.as_deref(), Some("pilot"));
        assert_eq!(record.pictures, vec![Picture::new("cover", "https://img/1.jpg")]);
        assert_eq!(record.ordered_ids("star"), vec!["s1", "s2"]);
        assert!(!record.fields.contains_key("star"));
        assert!(!record.fields.contains_key("type"));
        assert_eq!(record.ref_id("series_id").as_deref(), Some("7"));
        assert_eq!(record.fields["duration"], json!(42));
    }

    #[test]
    fn test_from_json_falls_back_to_name_for_title() {
        let raw = json!({"id": "b1", "name": "Acme"});
        let record = SourceRecord::from_json(EntityKind::Brand.into(), raw).unwrap();
        assert_eq!(record.title.as_deref(), Some("Acme"));
        assert_eq!(record.str_field("name"), Some("Acme"));
    }

    #[test]
    fn test_from_json_rejects_bad_payloads() {
        let kind = SourceKind::from(EntityKind::Brand);
        assert_eq!(
            SourceRecord::from_json(kind, json!([1, 2])).unwrap_err(),
            RecordError::NotAnObject
        );
        assert_eq!(
            SourceRecord::from_json(kind, json!({"title": "x"})).unwrap_err(),
            RecordError::MissingId
        );
        assert!(matches!(
            SourceRecord::from_json(kind, json!({"id": "1", "pictures": "nope"})).unwrap_err(),
            RecordError::InvalidField { .. }
        ));
    }

    #[test]
    fn test_decode_keeps_identity_of_malformed_payload() {
        let kind = SourceKind::from(EntityKind::Charity);

        let malformed = SourceRecord::decode(
            kind,
            json!({"id": 7, "environments": ["production"], "pictures": [{"type": "cover"}]}),
        )
        .unwrap_err();
        assert_eq!(malformed.id.as_deref(), Some("7"));
        assert!(malformed.is_in_environment("production"));
        assert!(matches!(malformed.error, RecordError::InvalidField { ref field, .. } if field == "pictures"));

        let malformed = SourceRecord::decode(kind, json!({"title": "no id"})).unwrap_err();
        assert_eq!(malformed.id, None);
        assert_eq!(malformed.error, RecordError::MissingId);

        assert!(SourceRecord::decode(kind, json!({"id": "c1"})).is_ok());
    }

    #[test]
    fn test_ref_ids_accepts_scalars_and_lists() {
        let record = SourceRecord::new(EntityKind::Brand, "b1")
            .with_field("offer", json!(["o1", 2, null]))
            .with_field("video", json!("v1"));

        assert_eq!(record.ref_ids("offer"), vec!["o1", "2"]);
        assert_eq!(record.ref_ids("video"), vec!["v1"]);
        assert_eq!(record.ref_id("offer").as_deref(), Some("o1"));
        assert!(record.references("offer", "2"));
        assert!(record.ref_ids("missing").is_empty());
    }
}
