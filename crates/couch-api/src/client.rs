//! Server-level CouchDB operations.

use std::sync::{Arc, RwLock};

use serde_json::Value;
use tracing::instrument;

use couch_http::{
    ClientConfig, CouchResponse, Credentials, Error, ErrorKind, HttpClient, RequestSpec, Result,
};

use crate::db::Database;
use crate::types::{DocumentResponse, SessionResponse};
use crate::users;

/// CouchDB server client.
///
/// Holds the HTTP client and the base server URL. The base URL is mutable
/// for the lifetime of the client and is read when each request is
/// composed: changing it affects operations issued afterwards, never ones
/// already in flight. Clones share the same base URL.
///
/// Default credentials, when set, are attached to every request that does
/// not carry its own.
#[derive(Debug, Clone)]
pub struct CouchClient {
    http: HttpClient,
    base_url: Arc<RwLock<String>>,
    credentials: Option<Credentials>,
}

impl CouchClient {
    /// Create a client for the given server, e.g. `http://localhost:5984`.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_config(base_url, ClientConfig::default())
    }

    /// Create a client with custom HTTP configuration.
    pub fn with_config(base_url: impl Into<String>, config: ClientConfig) -> Result<Self> {
        let base_url = base_url.into();
        url::Url::parse(&base_url)?;
        Ok(Self {
            http: HttpClient::new(config)?,
            base_url: Arc::new(RwLock::new(
                base_url.trim_end_matches('/').to_string(),
            )),
            credentials: None,
        })
    }

    /// Attach default credentials, used by any request without its own.
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Get the current base server URL.
    pub fn base_url(&self) -> String {
        match self.base_url.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Change the base server URL. Takes effect for requests composed after
    /// the call; in-flight requests are unaffected.
    pub fn set_base_url(&self, base_url: impl Into<String>) -> Result<()> {
        let base_url = base_url.into();
        url::Url::parse(&base_url)?;
        let value = base_url.trim_end_matches('/').to_string();
        match self.base_url.write() {
            Ok(mut guard) => *guard = value,
            Err(poisoned) => *poisoned.into_inner() = value,
        }
        Ok(())
    }

    /// Build a server-relative URL from the current base URL.
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url(), path.trim_start_matches('/'))
    }

    /// Execute a spec, attaching default credentials if it has none.
    pub(crate) async fn execute(&self, spec: RequestSpec) -> Result<CouchResponse> {
        let spec = match &self.credentials {
            Some(credentials) if !spec.has_credentials() => {
                spec.credentials(credentials.clone())
            }
            _ => spec,
        };
        self.http.execute(&spec).await
    }

    /// Get a handle on a database.
    ///
    /// The handle's URI is derived from the base URL at this point and is
    /// immutable afterwards.
    pub fn db(&self, name: &str) -> Database {
        Database::new(self.clone(), name)
    }

    /// Fetch the list of all databases.
    #[instrument(skip(self))]
    pub async fn all_dbs(&self) -> Result<Vec<String>> {
        self.execute(RequestSpec::get(self.url("_all_dbs")))
            .await?
            .decode()
    }

    /// Get information about the server.
    #[instrument(skip(self))]
    pub async fn server_info(&self) -> Result<Value> {
        self.execute(RequestSpec::get(self.url("")))
            .await?
            .decode()
    }

    fn config_url(&self, section: Option<&str>, key: Option<&str>) -> String {
        let mut url = self.url("_config/");
        if let Some(section) = section {
            url.push_str(&urlencoding::encode(section));
            url.push('/');
            if let Some(key) = key {
                url.push_str(&urlencoding::encode(key));
            }
        }
        url
    }

    /// Read server configuration: the whole tree, one section, or one key.
    #[instrument(skip(self))]
    pub async fn config(&self, section: Option<&str>, key: Option<&str>) -> Result<Value> {
        self.execute(RequestSpec::get(self.config_url(section, key)))
            .await?
            .decode()
    }

    /// Set one configuration value. Returns the previous value.
    #[instrument(skip(self, value))]
    pub async fn set_config(&self, section: &str, key: &str, value: &Value) -> Result<Value> {
        // the config API takes a bare JSON value, already serialized
        self.execute(
            RequestSpec::put(self.config_url(Some(section), Some(key))).raw(value.to_string()),
        )
        .await?
        .decode()
    }

    /// Delete one configuration value. Returns the previous value.
    #[instrument(skip(self))]
    pub async fn delete_config(&self, section: &str, key: &str) -> Result<Value> {
        self.execute(RequestSpec::delete(self.config_url(Some(section), Some(key))))
            .await?
            .decode()
    }

    /// Ask the server who the current user is.
    #[instrument(skip(self))]
    pub async fn session(&self) -> Result<SessionResponse> {
        self.execute(
            RequestSpec::get(self.url("_session")).header("Accept", "application/json"),
        )
        .await?
        .decode()
    }

    /// Authenticate with the given credentials and return the session.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<SessionResponse> {
        self.execute(
            RequestSpec::get(self.url("_session"))
                .header("Accept", "application/json")
                .credentials(Credentials::new(username, password)),
        )
        .await?
        .decode()
    }

    /// End the current session. Sends the reserved anonymous credential
    /// pair so any default credentials are not re-asserted.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<Value> {
        self.execute(
            RequestSpec::delete(self.url("_session")).credentials(Credentials::anonymous()),
        )
        .await?
        .decode()
    }

    /// Create a user account.
    ///
    /// The document needs at least a `name` field; `_id`, `type`, `roles`,
    /// and the salted password hash are filled in, the authentication
    /// database is resolved through the session, and the document is saved
    /// there. Fails before any network activity if password hashing is not
    /// available (the `signup` cargo feature).
    #[instrument(skip(self, user_doc, password))]
    pub async fn signup(&self, user_doc: Value, password: &str) -> Result<DocumentResponse> {
        let user_doc = users::prepare_user_doc(user_doc, Some(password))?;
        let session = self.session().await?;
        let auth_db = session.info.authentication_db.ok_or_else(|| {
            Error::new(ErrorKind::Config(
                "session does not report an authentication database".into(),
            ))
        })?;
        self.db(&auth_db).save_doc(&user_doc).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_rejects_invalid_base_url() {
        let err = CouchClient::new("not a url").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidUrl(_)));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let couch = CouchClient::new("http://localhost:5984/").unwrap();
        assert_eq!(couch.base_url(), "http://localhost:5984");
        assert_eq!(couch.url("_all_dbs"), "http://localhost:5984/_all_dbs");
    }

    #[test]
    fn test_set_base_url_shared_across_clones() {
        let couch = CouchClient::new("http://one:5984").unwrap();
        let clone = couch.clone();
        couch.set_base_url("http://two:5984").unwrap();
        assert_eq!(clone.base_url(), "http://two:5984");

        assert!(couch.set_base_url("nope").is_err());
        assert_eq!(couch.base_url(), "http://two:5984");
    }

    #[tokio::test]
    async fn test_all_dbs() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/_all_dbs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(["_users", "albums"])))
            .mount(&mock_server)
            .await;

        let couch = CouchClient::new(mock_server.uri()).unwrap();
        assert_eq!(couch.all_dbs().await.unwrap(), vec!["_users", "albums"]);
    }

    #[tokio::test]
    async fn test_login_sends_basic_auth() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/_session"))
            .and(header("Authorization", "Basic YWRtaW46c2VjcmV0"))
            .and(header("Accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "userCtx": { "name": "admin", "roles": ["_admin"] }
            })))
            .mount(&mock_server)
            .await;

        let couch = CouchClient::new(mock_server.uri()).unwrap();
        let session = couch.login("admin", "secret").await.unwrap();
        assert_eq!(session.user_ctx.name.as_deref(), Some("admin"));
    }

    #[tokio::test]
    async fn test_logout_uses_anonymous_sentinel() {
        let mock_server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/_session"))
            .and(header("Authorization", "Basic Xzpf"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .mount(&mock_server)
            .await;

        // default credentials must not leak into logout
        let couch = CouchClient::new(mock_server.uri())
            .unwrap()
            .with_credentials(Credentials::new("admin", "secret"));
        let resp = couch.logout().await.unwrap();
        assert_eq!(resp, json!({ "ok": true }));
    }

    #[tokio::test]
    async fn test_default_credentials_applied() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/_all_dbs"))
            .and(header("Authorization", "Basic YWRtaW46c2VjcmV0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&mock_server)
            .await;

        let couch = CouchClient::new(mock_server.uri())
            .unwrap()
            .with_credentials(Credentials::new("admin", "secret"));
        assert!(couch.all_dbs().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_config_roundtrip() {
        let mock_server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/_config/log/level"))
            .and(body_string("\"debug\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!("info")))
            .mount(&mock_server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/_config/log/level"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!("debug")))
            .mount(&mock_server)
            .await;

        let couch = CouchClient::new(mock_server.uri()).unwrap();
        let previous = couch
            .set_config("log", "level", &json!("debug"))
            .await
            .unwrap();
        assert_eq!(previous, json!("info"));

        let previous = couch.delete_config("log", "level").await.unwrap();
        assert_eq!(previous, json!("debug"));
    }

    #[cfg(feature = "signup")]
    #[tokio::test]
    async fn test_signup_resolves_auth_db_and_saves() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/_session"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "userCtx": { "name": null, "roles": [] },
                "info": { "authentication_db": "_users" }
            })))
            .mount(&mock_server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/_users/org.couchdb.user%3Ajan"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "ok": true,
                "id": "org.couchdb.user:jan",
                "rev": "1-abc"
            })))
            .mount(&mock_server)
            .await;

        let couch = CouchClient::new(mock_server.uri()).unwrap();
        let saved = couch.signup(json!({ "name": "jan" }), "apple").await.unwrap();
        assert_eq!(saved.id, "org.couchdb.user:jan");
    }
}
