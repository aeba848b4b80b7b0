//! Typed response payloads for well-known CouchDB envelopes.

use serde_json::Value;

/// Response to a document write (save, remove, copy).
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct DocumentResponse {
    #[serde(default)]
    pub ok: bool,
    pub id: String,
    pub rev: String,
}

/// Information about a database, as returned by `GET /{db}`.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct DatabaseInfo {
    pub db_name: String,
    #[serde(default)]
    pub doc_count: u64,
    #[serde(default)]
    pub doc_del_count: u64,
    /// Opaque in newer servers, an integer in older ones.
    #[serde(default)]
    pub update_seq: Value,
    #[serde(default)]
    pub compact_running: bool,
    #[serde(default)]
    pub disk_size: Option<u64>,
    #[serde(default)]
    pub instance_start_time: Option<String>,
}

/// Response to `GET /_session`.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct SessionResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(rename = "userCtx")]
    pub user_ctx: UserContext,
    #[serde(default)]
    pub info: SessionInfo,
}

/// The user context of a session: who the server thinks you are.
#[derive(Debug, Clone, Default, serde::Deserialize, serde::Serialize)]
pub struct UserContext {
    /// None for the anonymous user.
    pub name: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Server-side session details.
#[derive(Debug, Clone, Default, serde::Deserialize, serde::Serialize)]
pub struct SessionInfo {
    /// The database holding user documents, usually `_users`.
    #[serde(default)]
    pub authentication_db: Option<String>,
    #[serde(default)]
    pub authenticated: Option<String>,
    #[serde(default)]
    pub authentication_handlers: Vec<String>,
}
