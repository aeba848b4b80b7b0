//! Request model and composition.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use crate::encode;

/// HTTP request method. CouchDB uses COPY in addition to the usual verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Copy,
}

impl Method {
    /// Convert to reqwest::Method.
    pub fn to_reqwest(self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
            Method::Copy => reqwest::Method::from_bytes(b"COPY").expect("COPY is a valid token"),
        }
    }

    /// True if this method carries structured data as a request body rather
    /// than in the query string.
    pub fn has_body(self) -> bool {
        matches!(self, Method::Post | Method::Put)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Copy => "COPY",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request payload, resolved once at composition time.
///
/// `Raw` is sent verbatim. A `Json` object is serialized as the request
/// body for POST/PUT and relocated to the query string for every other
/// method; non-object `Json` values are always serialized as the body.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Raw(String),
    Json(Value),
}

/// Username/password pair for HTTP Basic authentication.
///
/// The password is redacted in Debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Credentials {
    /// Create credentials with the given username and password.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// The reserved sentinel pair used for anonymous operations (logout).
    pub fn anonymous() -> Self {
        Self::new("_", "_")
    }

    /// Get the username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Build the `Authorization` header value for these credentials.
    pub fn header_value(&self) -> String {
        encode::basic_auth(&self.username, &self.password)
    }
}

/// A logical request before composition.
///
/// Defaults: method GET, acceptable statuses `{200}`, no body, no extra
/// headers, no credentials.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    method: Method,
    url: String,
    data: Option<Body>,
    headers: BTreeMap<String, String>,
    success_statuses: Vec<u16>,
    credentials: Option<Credentials>,
}

/// A fully composed request, ready for transport.
///
/// Composition is pure: resolving the same spec twice yields identical
/// output, header order included.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRequest {
    pub method: Method,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
    pub success_statuses: Vec<u16>,
}

impl RequestSpec {
    /// Create a new spec with the given method and URL.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            data: None,
            headers: BTreeMap::new(),
            success_statuses: vec![200],
            credentials: None,
        }
    }

    /// Create a GET request spec.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    /// Create a POST request spec.
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    /// Create a PUT request spec.
    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::Put, url)
    }

    /// Create a DELETE request spec.
    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::Delete, url)
    }

    /// Create a COPY request spec.
    pub fn copy(url: impl Into<String>) -> Self {
        Self::new(Method::Copy, url)
    }

    /// Attach a structured JSON payload.
    pub fn json(mut self, value: Value) -> Self {
        self.data = Some(Body::Json(value));
        self
    }

    /// Attach an already-serialized payload, sent verbatim.
    pub fn raw(mut self, body: impl Into<String>) -> Self {
        self.data = Some(Body::Raw(body.into()));
        self
    }

    /// Add a header. Caller headers override generated ones.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Replace the acceptable-status set with a single status.
    pub fn success_status(self, status: u16) -> Self {
        self.success_statuses([status])
    }

    /// Replace the acceptable-status set. The set is normalized (sorted,
    /// deduplicated) and never empty; an empty input keeps the default.
    pub fn success_statuses(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        let mut statuses: Vec<u16> = statuses.into_iter().collect();
        statuses.sort_unstable();
        statuses.dedup();
        if !statuses.is_empty() {
            self.success_statuses = statuses;
        }
        self
    }

    /// Attach Basic-auth credentials.
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// True if credentials have been attached.
    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    /// Get the method.
    pub fn method(&self) -> Method {
        self.method
    }

    /// Get the URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Compose the spec into a wire-ready request.
    ///
    /// In order: a JSON object payload is relocated to the query string for
    /// methods without a body (GET, DELETE, COPY), while raw and non-object
    /// JSON payloads stay in place; `Accept: */*` and, for POST/PUT,
    /// `Content-Type: application/json` are set; credentials become an
    /// `Authorization` header; caller headers are overlaid last and win;
    /// any remaining payload is serialized to text.
    pub fn resolve(&self) -> ResolvedRequest {
        let mut url = self.url.clone();
        let mut data = self.data.clone();

        if !self.method.has_body() {
            data = match data {
                Some(Body::Json(Value::Object(params))) => {
                    let query = encode::query_string(&params);
                    if !query.is_empty() {
                        url.push(if url.contains('?') { '&' } else { '?' });
                        url.push_str(&query);
                    }
                    None
                }
                other => other,
            };
        }

        let mut headers = BTreeMap::new();
        headers.insert("Accept".to_string(), "*/*".to_string());
        if self.method.has_body() {
            headers.insert("Content-Type".to_string(), "application/json".to_string());
        }
        if let Some(credentials) = &self.credentials {
            headers.insert("Authorization".to_string(), credentials.header_value());
        }
        for (name, value) in &self.headers {
            headers.insert(name.clone(), value.clone());
        }

        let body = data.map(|body| match body {
            Body::Raw(text) => text,
            Body::Json(value) => value.to_string(),
        });

        ResolvedRequest {
            method: self.method,
            url,
            headers,
            body,
            success_statuses: self.success_statuses.clone(),
        }
    }
}
