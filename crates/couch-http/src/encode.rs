//! Encoding primitives: query strings, view options, document ids, Basic auth.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::{Map, Value};

/// View query options recognized by CouchDB's HTTP view API.
///
/// Keys outside this set are silently dropped from the encoded query. That
/// is deliberate: the server rejects unknown options, and the original
/// behavior of tolerating stray keys in an options map is kept as policy.
/// `keys` is handled out of band (it moves into a POST body).
pub const VIEW_OPTIONS: &[&str] = &[
    "key",
    "startkey",
    "startkey_docid",
    "endkey",
    "endkey_docid",
    "limit",
    "stale",
    "descending",
    "skip",
    "group",
    "group_level",
    "reduce",
    "include_docs",
    "inclusive_end",
];

/// Keys whose values are sent as JSON text in a generic query string.
const JSON_QUERY_KEYS: &[&str] = &["key", "startkey", "endkey"];

/// Literal text form of a JSON value for query-string purposes: strings are
/// taken as-is, everything else uses its JSON representation.
fn literal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Encode a parameter map into a query string (no leading `?`).
///
/// The values of `key`, `startkey`, and `endkey` are JSON-serialized first,
/// since CouchDB interprets those parameters as JSON. Both keys and values
/// are percent-encoded; entries are joined with `&`. An empty map encodes to
/// an empty string.
pub fn query_string(params: &Map<String, Value>) -> String {
    let mut buf = Vec::with_capacity(params.len());
    for (name, value) in params {
        let text = if JSON_QUERY_KEYS.contains(&name.as_str()) {
            value.to_string()
        } else {
            literal(value)
        };
        buf.push(format!(
            "{}={}",
            urlencoding::encode(name),
            urlencoding::encode(&text)
        ));
    }
    buf.join("&")
}

/// Encode a view-option map into a query string (no leading `?`).
///
/// Every whitelisted option value is JSON-serialized and percent-encoded;
/// keys not in [`VIEW_OPTIONS`] are dropped without error.
pub fn view_query(params: &Map<String, Value>) -> String {
    let mut buf = Vec::new();
    for (name, value) in params {
        if VIEW_OPTIONS.contains(&name.as_str()) {
            buf.push(format!(
                "{}={}",
                urlencoding::encode(name),
                urlencoding::encode(&value.to_string())
            ));
        }
    }
    buf.join("&")
}

/// Percent-encode a document id for use in a URL path.
///
/// `_design/<name>` is a structural path prefix, not an opaque identifier:
/// the leading `_design/` is kept literal and only the remainder is encoded.
/// Any other id is encoded as a single token, slashes included.
pub fn doc_id(id: &str) -> String {
    let mut parts = id.split('/');
    if parts.next() == Some("_design") {
        let rest = parts.collect::<Vec<_>>().join("/");
        format!("_design/{}", urlencoding::encode(&rest))
    } else {
        urlencoding::encode(id).into_owned()
    }
}

/// Build an HTTP Basic `Authorization` header value.
pub fn basic_auth(username: &str, password: &str) -> String {
    format!("Basic {}", BASE64.encode(format!("{username}:{password}")))
}
