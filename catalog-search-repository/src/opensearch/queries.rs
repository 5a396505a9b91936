//! OpenSearch query builders.
//!
//! This module translates a [`SearchQuery`] into the OpenSearch query DSL and
//! builds the scan query used to list stored IDs per kind.

use serde_json::{json, Map, Value};

use catalog_search_shared::{EntityKind, SearchQuery, SortOrder};

/// Fields the free-text term is matched against.
const TEXT_FIELDS: [&str; 2] = ["name", "title"];

/// Character stripped from free text before building the wildcard pattern.
const SENTINEL_CHAR: char = '$';

/// Characters `query_string` gives a meaning to. User text escapes them so
/// only the wildcards the pattern adds are live.
const RESERVED_CHARS: [char; 20] = [
    '+', '-', '=', '&', '|', '!', '(', ')', '{', '}', '[', ']', '^', '"', '~', '*', '?', ':',
    '\\', '/',
];

/// Escape one token for `query_string`. `<` and `>` cannot be escaped and
/// are dropped.
fn escape_token(token: &str) -> String {
    let mut escaped = String::with_capacity(token.len());
    for c in token.chars() {
        match c {
            '<' | '>' => {}
            c if RESERVED_CHARS.contains(&c) => {
                escaped.push('\\');
                escaped.push(c);
            }
            c => escaped.push(c),
        }
    }
    escaped
}

/// Build the wildcard pattern for a free-text term.
///
/// The term is tokenized on whitespace and every token must match as a word
/// prefix: `"red shoes"` becomes `red* AND *shoes*`. Reserved characters in
/// the term are escaped. Returns `None` when nothing is left after stripping
/// the sentinel character.
pub fn build_text_pattern(term: &str) -> Option<String> {
    let cleaned: String = term.chars().filter(|c| *c != SENTINEL_CHAR).collect();
    let tokens: Vec<String> = cleaned
        .split_whitespace()
        .map(|token| escape_token(&token.to_lowercase()))
        .filter(|token| !token.is_empty())
        .collect();

    if tokens.is_empty() {
        return None;
    }

    let pattern = tokens
        .iter()
        .enumerate()
        .map(|(i, token)| {
            if i == 0 {
                format!("{}*", token)
            } else {
                format!("*{}*", token)
            }
        })
        .collect::<Vec<_>>()
        .join(" AND ");

    Some(pattern)
}

/// Build an OpenSearch request body from a SearchQuery.
///
/// The query builder handles:
/// - A wildcard `query_string` over `name`/`title` for the free-text term
/// - One `query_string` clause per caller-supplied field filter
/// - `exists` clauses that every hit must satisfy
/// - Type and ID restriction as non-scoring filters
/// - Pagination and sort
pub fn build_search_query(query: &SearchQuery) -> Value {
    let mut should = Vec::new();
    if let Some(pattern) = query.text_term().and_then(build_text_pattern) {
        should.push(build_text_clause(&pattern));
    }
    for filter in &query.filters {
        should.push(json!({
            "query_string": {
                "query": filter.query,
                "fields": filter.fields
            }
        }));
    }

    let must: Vec<Value> = query
        .exists
        .iter()
        .map(|field| json!({ "exists": { "field": field } }))
        .collect();

    let mut filter = Vec::new();
    if !query.types.is_empty() {
        filter.push(json!({ "terms": { "type": query.types } }));
    }
    if !query.ids.is_empty() {
        filter.push(json!({ "terms": { "id": query.ids } }));
    }

    let mut body = Map::new();
    body.insert("query".to_string(), build_bool_query(should, must, filter));
    body.insert("from".to_string(), json!(query.offset));
    body.insert("size".to_string(), json!(query.limit));
    body.insert("track_total_hits".to_string(), json!(true));
    if !query.sort.is_empty() {
        let sort: Vec<Value> = query
            .sort
            .iter()
            .map(|s| {
                let order = match s.order {
                    SortOrder::Asc => "asc",
                    SortOrder::Desc => "desc",
                };
                let mut clause = Map::new();
                clause.insert(s.field.clone(), json!({ "order": order }));
                Value::Object(clause)
            })
            .collect();
        body.insert("sort".to_string(), Value::Array(sort));
    }

    Value::Object(body)
}

/// Build the query listing stored document IDs of one kind, one page at a time.
///
/// Pages are walked with `search_after` over the keyword `id` field.
pub fn build_scan_query(kind: EntityKind, page_size: usize, after: Option<&str>) -> Value {
    let mut body = json!({
        "size": page_size,
        "_source": ["id"],
        "query": {
            "term": { "type": kind.as_str() }
        },
        "sort": [
            { "id": "asc" }
        ]
    });
    if let Some(after) = after {
        body["search_after"] = json!([after]);
    }
    body
}

fn build_text_clause(pattern: &str) -> Value {
    json!({
        "query_string": {
            "query": pattern,
            "fields": TEXT_FIELDS,
            "analyze_wildcard": true
        }
    })
}

fn build_bool_query(should: Vec<Value>, must: Vec<Value>, filter: Vec<Value>) -> Value {
    if should.is_empty() && must.is_empty() && filter.is_empty() {
        return json!({ "match_all": {} });
    }

    let mut bool_query = Map::new();
    if !should.is_empty() {
        bool_query.insert("should".to_string(), Value::Array(should));
        // With `must` present OpenSearch would treat `should` as scoring only.
        bool_query.insert("minimum_should_match".to_string(), json!(1));
    }
    if !must.is_empty() {
        bool_query.insert("must".to_string(), Value::Array(must));
    }
    if !filter.is_empty() {
        bool_query.insert("filter".to_string(), Value::Array(filter));
    }

    json!({ "bool": bool_query })
}
