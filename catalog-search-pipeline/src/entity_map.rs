//! ID-keyed lookup tables over fetched collections.
//!
//! Maps are built fresh for every indexing run and dropped with it.

use std::collections::HashMap;

use catalog_search_shared::{SourceKind, SourceRecord};

/// Records of one collection keyed by ID, in fetch order.
#[derive(Debug, Clone, Default)]
pub struct EntityMap {
    records: Vec<SourceRecord>,
    positions: HashMap<String, usize>,
}

impl EntityMap {
    /// Key `records` by ID.
    ///
    /// A duplicate ID overwrites the earlier record in place, so iteration
    /// order stays the order in which IDs were first seen.
    pub fn build(records: Vec<SourceRecord>) -> Self {
        let mut map = Self::default();
        for record in records {
            match map.positions.get(&record.id) {
                Some(&position) => map.records[position] = record,
                None => {
                    map.positions.insert(record.id.clone(), map.records.len());
                    map.records.push(record);
                }
            }
        }
        map
    }

    pub fn get(&self, id: &str) -> Option<&SourceRecord> {
        self.positions.get(id).map(|&position| &self.records[position])
    }

    /// Resolve IDs in order, silently dropping the ones that are missing.
    pub fn resolve_all<I>(&self, ids: I) -> Vec<&SourceRecord>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        ids.into_iter()
            .filter_map(|id| self.get(id.as_ref()))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Shorthand for [`EntityMap::build`].
pub fn build_map(records: Vec<SourceRecord>) -> EntityMap {
    EntityMap::build(records)
}

/// The auxiliary maps one indexer joins against.
///
/// Lookups in a collection that was never loaded behave like lookups in an
/// empty collection.
#[derive(Debug, Default)]
pub struct JoinContext {
    maps: HashMap<SourceKind, EntityMap>,
    empty: EntityMap,
}

impl JoinContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: SourceKind, map: EntityMap) {
        self.maps.insert(kind, map);
    }

    /// Add a collection from raw records. Mostly useful in tests.
    pub fn with(mut self, kind: impl Into<SourceKind>, records: Vec<SourceRecord>) -> Self {
        self.insert(kind.into(), EntityMap::build(records));
        self
    }

    pub fn map(&self, kind: impl Into<SourceKind>) -> &EntityMap {
        self.maps.get(&kind.into()).unwrap_or(&self.empty)
    }

    pub fn resolve(&self, kind: impl Into<SourceKind>, id: &str) -> Option<&SourceRecord> {
        self.map(kind).get(id)
    }

    pub fn resolve_all<I>(&self, kind: impl Into<SourceKind>, ids: I) -> Vec<&SourceRecord>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.map(kind).resolve_all(ids)
    }

    pub fn records(&self, kind: impl Into<SourceKind>) -> impl Iterator<Item = &SourceRecord> {
        self.map(kind).iter()
    }
}
