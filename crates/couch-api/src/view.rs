//! View query options and results.

use serde_json::{json, Map, Value};

use couch_http::encode;

/// Staleness tolerance for a view query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum Stale {
    #[serde(rename = "ok")]
    Ok,
    #[serde(rename = "update_after")]
    UpdateAfter,
}

/// Options for view, `_all_docs`, and `_list` queries.
///
/// Every recognized option is an explicit field; there is no way to smuggle
/// an unknown option through. `keys` never appears in the query string: when
/// set, the request switches to POST and carries `{"keys": [...]}` as its
/// body.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ViewOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub startkey: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub startkey_docid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endkey: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endkey_docid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stale: Option<Stale>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descending: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_level: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reduce: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_docs: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inclusive_end: Option<bool>,
    /// Handled out of band; see the type docs.
    #[serde(skip)]
    pub keys: Option<Vec<Value>>,
}

impl ViewOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(mut self, key: impl Into<Value>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn startkey(mut self, key: impl Into<Value>) -> Self {
        self.startkey = Some(key.into());
        self
    }

    pub fn startkey_docid(mut self, id: impl Into<String>) -> Self {
        self.startkey_docid = Some(id.into());
        self
    }

    pub fn endkey(mut self, key: impl Into<Value>) -> Self {
        self.endkey = Some(key.into());
        self
    }

    pub fn endkey_docid(mut self, id: impl Into<String>) -> Self {
        self.endkey_docid = Some(id.into());
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn stale(mut self, stale: Stale) -> Self {
        self.stale = Some(stale);
        self
    }

    pub fn descending(mut self, descending: bool) -> Self {
        self.descending = Some(descending);
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn group(mut self, group: bool) -> Self {
        self.group = Some(group);
        self
    }

    pub fn group_level(mut self, level: u64) -> Self {
        self.group_level = Some(level);
        self
    }

    pub fn reduce(mut self, reduce: bool) -> Self {
        self.reduce = Some(reduce);
        self
    }

    pub fn include_docs(mut self, include: bool) -> Self {
        self.include_docs = Some(include);
        self
    }

    pub fn inclusive_end(mut self, inclusive: bool) -> Self {
        self.inclusive_end = Some(inclusive);
        self
    }

    /// Restrict the result to the given keys. Forces a POST request with
    /// the keys carried in the body.
    pub fn keys(mut self, keys: impl IntoIterator<Item = Value>) -> Self {
        self.keys = Some(keys.into_iter().collect());
        self
    }

    /// Encode into a query string (without `keys`) plus the out-of-band
    /// keys body, if any.
    pub(crate) fn to_query(&self) -> (String, Option<Value>) {
        let map = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            // all fields serialize to object entries
            _ => Map::new(),
        };
        let query = encode::view_query(&map);
        let keys = self.keys.as_ref().map(|keys| json!({ "keys": keys }));
        (query, keys)
    }
}

/// A view or `_all_docs` result.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct ViewResult {
    #[serde(default)]
    pub total_rows: Option<u64>,
    #[serde(default)]
    pub offset: Option<u64>,
    #[serde(default)]
    pub rows: Vec<ViewRow>,
}

/// One row of a view result.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct ViewRow {
    /// Absent for reduce rows.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub key: Value,
    #[serde(default)]
    pub value: Value,
    /// Present when `include_docs` was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<Value>,
}
