//! Response dispatch: content-type negotiation, parsing, and status checks.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, ErrorKind, Result};

/// A parsed response whose status was in the request's acceptable set.
#[derive(Debug, Clone)]
pub struct CouchResponse {
    /// HTTP status code.
    pub status: u16,
    /// Parsed body. JSON responses are parsed; anything else is carried as
    /// a JSON string.
    pub body: Value,
    headers: BTreeMap<String, String>,
}

impl CouchResponse {
    /// Get a response header value. Names are matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(|s| s.as_str())
    }

    /// Get the Content-Type header.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Get the ETag header, which CouchDB uses to carry document revisions.
    pub fn etag(&self) -> Option<&str> {
        self.header("etag")
    }

    /// Deserialize the body into a typed value.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T> {
        serde_json::from_value(self.body).map_err(Into::into)
    }
}

/// Interpret a terminal transport outcome.
///
/// The body is parsed first when the content type indicates JSON; a parse
/// failure wins over the status check and surfaces the raw body. Otherwise
/// membership of `status` in the acceptable set decides between `Ok` and a
/// status error carrying the raw response text. Exactly one of the three
/// outcomes is produced.
pub(crate) fn dispatch(
    status: u16,
    headers: BTreeMap<String, String>,
    raw_body: String,
    success_statuses: &[u16],
) -> Result<CouchResponse> {
    let is_json = headers
        .get("content-type")
        .is_some_and(|ct| ct.contains("json"));

    let body = if is_json && !raw_body.is_empty() {
        match serde_json::from_str(&raw_body) {
            Ok(value) => value,
            Err(err) => {
                return Err(Error::with_source(
                    ErrorKind::Parse {
                        message: err.to_string(),
                        body: raw_body,
                    },
                    err,
                ));
            }
        }
    } else {
        Value::String(raw_body.clone())
    };

    if success_statuses.contains(&status) {
        Ok(CouchResponse {
            status,
            body,
            headers,
        })
    } else {
        Err(Error::new(ErrorKind::Status {
            status,
            body: raw_body,
        }))
    }
}
