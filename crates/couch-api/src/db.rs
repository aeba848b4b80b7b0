//! Per-database operations: documents, bulk writes, views, compaction.

use serde_json::{json, Value};
use tracing::instrument;

use couch_http::{encode, Error, ErrorKind, RequestSpec, Result};

use crate::client::CouchClient;
use crate::types::{DatabaseInfo, DocumentResponse};
use crate::view::{ViewOptions, ViewResult};

/// Handle on one database.
///
/// The URI is derived from the client's base URL when the handle is created
/// and is immutable afterwards; a later `set_base_url` on the client does
/// not move existing handles.
#[derive(Debug, Clone)]
pub struct Database {
    client: CouchClient,
    name: String,
    uri: String,
}

impl Database {
    pub(crate) fn new(client: CouchClient, name: &str) -> Self {
        let uri = format!("{}/", client.url(&urlencoding::encode(name)));
        Self {
            client,
            name: name.to_string(),
            uri,
        }
    }

    /// The database name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The database URI, percent-encoded, with a trailing slash.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Create the database.
    #[instrument(skip(self), fields(db = %self.name))]
    pub async fn create(&self) -> Result<Value> {
        self.client
            .execute(RequestSpec::put(&self.uri).success_status(201))
            .await?
            .decode()
    }

    /// Delete the database and everything in it.
    #[instrument(skip(self), fields(db = %self.name))]
    pub async fn drop(&self) -> Result<Value> {
        self.client
            .execute(RequestSpec::delete(&self.uri))
            .await?
            .decode()
    }

    /// Get information about the database.
    #[instrument(skip(self), fields(db = %self.name))]
    pub async fn info(&self) -> Result<DatabaseInfo> {
        self.client
            .execute(RequestSpec::get(&self.uri))
            .await?
            .decode()
    }

    /// Request compaction of the database.
    #[instrument(skip(self), fields(db = %self.name))]
    pub async fn compact(&self) -> Result<Value> {
        self.client
            .execute(RequestSpec::post(format!("{}_compact", self.uri)).success_status(202))
            .await?
            .decode()
    }

    /// Compact the view indexes of one design document's view group.
    #[instrument(skip(self), fields(db = %self.name))]
    pub async fn compact_view(&self, group: &str) -> Result<Value> {
        self.client
            .execute(
                RequestSpec::post(format!(
                    "{}_compact/{}",
                    self.uri,
                    urlencoding::encode(group)
                ))
                .success_status(202),
            )
            .await?
            .decode()
    }

    /// Clean up stale view output on disk.
    #[instrument(skip(self), fields(db = %self.name))]
    pub async fn view_cleanup(&self) -> Result<Value> {
        self.client
            .execute(RequestSpec::post(format!("{}_view_cleanup", self.uri)).success_status(202))
            .await?
            .decode()
    }

    /// Run a view-shaped request: options in the query string, or a POST
    /// with a keys body when `keys` is set.
    async fn fetch_view(&self, mut url: String, options: &ViewOptions) -> Result<ViewResult> {
        let (query, keys) = options.to_query();
        if !query.is_empty() {
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str(&query);
        }
        let spec = match keys {
            Some(body) => RequestSpec::post(url).json(body),
            None => RequestSpec::get(url),
        };
        self.client.execute(spec).await?.decode()
    }

    /// Fetch all docs, or the docs named in `options.keys`.
    #[instrument(skip(self, options), fields(db = %self.name))]
    pub async fn all_docs(&self, options: &ViewOptions) -> Result<ViewResult> {
        self.fetch_view(format!("{}_all_docs", self.uri), options)
            .await
    }

    /// Fetch all design docs.
    #[instrument(skip(self, options), fields(db = %self.name))]
    pub async fn all_design_docs(&self, options: &ViewOptions) -> Result<ViewResult> {
        // key range covering exactly the _design/ namespace
        let options = options
            .clone()
            .startkey(json!("_design"))
            .endkey(json!("_design0"));
        self.all_docs(&options).await
    }

    /// Fetch one document by id.
    #[instrument(skip(self), fields(db = %self.name))]
    pub async fn open_doc(&self, doc_id: &str) -> Result<Value> {
        self.client
            .execute(RequestSpec::get(format!(
                "{}{}",
                self.uri,
                encode::doc_id(doc_id)
            )))
            .await?
            .decode()
    }

    /// Save a document. Without an `_id` the server assigns one (POST to
    /// the database root); with an `_id` the document is written in place
    /// (PUT to the encoded id).
    #[instrument(skip(self, doc), fields(db = %self.name))]
    pub async fn save_doc(&self, doc: &Value) -> Result<DocumentResponse> {
        let spec = match doc.get("_id").and_then(Value::as_str) {
            Some(id) => RequestSpec::put(format!("{}{}", self.uri, encode::doc_id(id))),
            None => RequestSpec::post(&self.uri),
        };
        self.client
            .execute(spec.json(doc.clone()).success_statuses([200, 201, 202]))
            .await?
            .decode()
    }

    /// Save a list of documents in one request.
    #[instrument(skip(self, docs), fields(db = %self.name, count = docs.len()))]
    pub async fn bulk_save(&self, docs: Vec<Value>) -> Result<Value> {
        self.client
            .execute(
                RequestSpec::post(format!("{}_bulk_docs", self.uri))
                    .json(json!({ "docs": docs })),
            )
            .await?
            .decode()
    }

    /// Delete one document. The document must carry its `_id` and current
    /// `_rev`; the revision travels as a query parameter.
    #[instrument(skip(self, doc), fields(db = %self.name))]
    pub async fn remove_doc(&self, doc: &Value) -> Result<DocumentResponse> {
        let id = doc.get("_id").and_then(Value::as_str).ok_or_else(|| {
            Error::new(ErrorKind::Config("document to remove requires an _id".into()))
        })?;
        let rev = doc.get("_rev").and_then(Value::as_str).ok_or_else(|| {
            Error::new(ErrorKind::Config("document to remove requires a _rev".into()))
        })?;
        self.client
            .execute(
                RequestSpec::delete(format!("{}{}", self.uri, encode::doc_id(id)))
                    .json(json!({ "rev": rev })),
            )
            .await?
            .decode()
    }

    /// Delete a set of documents in one request. Every document is tagged
    /// `_deleted` before sending.
    #[instrument(skip(self, docs), fields(db = %self.name, count = docs.len()))]
    pub async fn bulk_remove(&self, docs: Vec<Value>) -> Result<Value> {
        let docs: Vec<Value> = docs
            .into_iter()
            .map(|mut doc| {
                if let Some(fields) = doc.as_object_mut() {
                    fields.insert("_deleted".to_string(), Value::Bool(true));
                }
                doc
            })
            .collect();
        self.client
            .execute(
                RequestSpec::post(format!("{}_bulk_docs", self.uri))
                    .json(json!({ "docs": docs }))
                    .success_status(201),
            )
            .await?
            .decode()
    }

    /// Copy an existing document to the destination id.
    #[instrument(skip(self), fields(db = %self.name))]
    pub async fn copy_doc(&self, source: &str, destination: &str) -> Result<Value> {
        self.client
            .execute(
                RequestSpec::copy(format!("{}{}", self.uri, encode::doc_id(source)))
                    .header("Destination", destination)
                    .success_status(201),
            )
            .await?
            .decode()
    }

    /// Create and execute a temporary view from map (and optional reduce)
    /// source text. Language defaults to `javascript`.
    #[instrument(skip(self, map, reduce), fields(db = %self.name))]
    pub async fn temp_view(
        &self,
        map: &str,
        reduce: Option<&str>,
        language: Option<&str>,
    ) -> Result<ViewResult> {
        let mut body = json!({
            "language": language.unwrap_or("javascript"),
            "map": map,
        });
        if let Some(reduce) = reduce {
            body["reduce"] = json!(reduce);
        }
        self.client
            .execute(RequestSpec::post(format!("{}_temp_view", self.uri)).json(body))
            .await?
            .decode()
    }

    /// Run a view through a `_list` function. `list` is `design/listname`.
    #[instrument(skip(self, options), fields(db = %self.name))]
    pub async fn list(&self, list: &str, view: &str, options: &ViewOptions) -> Result<ViewResult> {
        let (design, list_name) = split_design_path(list)?;
        let url = format!(
            "{}_design/{}/_list/{}/{}",
            self.uri,
            urlencoding::encode(design),
            urlencoding::encode(list_name),
            urlencoding::encode(view)
        );
        self.fetch_view(url, options).await
    }

    /// Query a view. `name` is `design/viewname`.
    #[instrument(skip(self, options), fields(db = %self.name))]
    pub async fn view(&self, name: &str, options: &ViewOptions) -> Result<ViewResult> {
        let (design, view_name) = split_design_path(name)?;
        let url = format!(
            "{}_design/{}/_view/{}",
            self.uri,
            urlencoding::encode(design),
            urlencoding::encode(view_name)
        );
        self.fetch_view(url, options).await
    }

    /// Fetch a database property such as `_revs_limit`.
    #[instrument(skip(self), fields(db = %self.name))]
    pub async fn get_property(&self, name: &str) -> Result<Value> {
        self.client
            .execute(RequestSpec::get(format!("{}{}", self.uri, name)))
            .await?
            .decode()
    }

    /// Set a database property such as `_revs_limit`.
    #[instrument(skip(self, value), fields(db = %self.name))]
    pub async fn set_property(&self, name: &str, value: &Value) -> Result<Value> {
        self.client
            .execute(RequestSpec::put(format!("{}{}", self.uri, name)).json(value.clone()))
            .await?
            .decode()
    }
}

fn split_design_path(name: &str) -> Result<(&str, &str)> {
    name.split_once('/').ok_or_else(|| {
        Error::new(ErrorKind::Config(format!(
            "expected `design/name`, got `{name}`"
        )))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn couch(mock_server: &MockServer) -> CouchClient {
        CouchClient::new(mock_server.uri()).unwrap()
    }

    #[tokio::test]
    async fn test_db_uri_is_encoded_and_snapshotted() {
        let couch = CouchClient::new("http://localhost:5984").unwrap();
        let db = couch.db("my/db");
        assert_eq!(db.uri(), "http://localhost:5984/my%2Fdb/");
        assert_eq!(db.name(), "my/db");

        couch.set_base_url("http://elsewhere:5984").unwrap();
        // existing handles keep the URI they were built with
        assert_eq!(db.uri(), "http://localhost:5984/my%2Fdb/");
    }

    #[tokio::test]
    async fn test_create_and_drop() {
        let mock_server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/albums/"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "ok": true })))
            .mount(&mock_server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/albums/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .mount(&mock_server)
            .await;

        let db = couch(&mock_server).await.db("albums");
        db.create().await.unwrap();
        db.drop().await.unwrap();
    }

    #[tokio::test]
    async fn test_save_doc_without_id_posts_to_root() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/albums/"))
            .and(body_json(json!({ "artist": "Eric Dolphy" })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "ok": true, "id": "generated", "rev": "1-abc"
            })))
            .mount(&mock_server)
            .await;

        let db = couch(&mock_server).await.db("albums");
        let saved = db.save_doc(&json!({ "artist": "Eric Dolphy" })).await.unwrap();
        assert_eq!(saved.id, "generated");
    }

    #[tokio::test]
    async fn test_save_doc_with_slash_id_puts_encoded() {
        let mock_server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/albums/a%2Fb"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "ok": true, "id": "a/b", "rev": "1-abc"
            })))
            .mount(&mock_server)
            .await;

        let db = couch(&mock_server).await.db("albums");
        let saved = db.save_doc(&json!({ "_id": "a/b" })).await.unwrap();
        assert_eq!(saved.rev, "1-abc");
    }

    #[tokio::test]
    async fn test_save_design_doc_keeps_structural_slash() {
        let mock_server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/albums/_design/music"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "ok": true, "id": "_design/music", "rev": "1-abc"
            })))
            .mount(&mock_server)
            .await;

        let db = couch(&mock_server).await.db("albums");
        db.save_doc(&json!({ "_id": "_design/music", "views": {} }))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_remove_doc_sends_rev_as_query_param() {
        let mock_server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/albums/doc1"))
            .and(query_param("rev", "3-ghi"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true, "id": "doc1", "rev": "4-jkl"
            })))
            .mount(&mock_server)
            .await;

        let db = couch(&mock_server).await.db("albums");
        let removed = db
            .remove_doc(&json!({ "_id": "doc1", "_rev": "3-ghi" }))
            .await
            .unwrap();
        assert_eq!(removed.rev, "4-jkl");

        let err = db.remove_doc(&json!({ "_id": "doc1" })).await.unwrap_err();
        assert!(err.is_config());
    }

    #[tokio::test]
    async fn test_bulk_remove_tags_every_doc() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/albums/_bulk_docs"))
            .and(body_json(json!({
                "docs": [
                    { "_id": "a", "_rev": "1-a", "_deleted": true },
                    { "_id": "b", "_rev": "1-b", "_deleted": true },
                    { "_id": "c", "_rev": "1-c", "_deleted": true }
                ]
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let db = couch(&mock_server).await.db("albums");
        db.bulk_remove(vec![
            json!({ "_id": "a", "_rev": "1-a" }),
            json!({ "_id": "b", "_rev": "1-b" }),
            json!({ "_id": "c", "_rev": "1-c" }),
        ])
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_copy_doc_sets_destination_header() {
        let mock_server = MockServer::start().await;
        Mock::given(method("COPY"))
            .and(path("/albums/source"))
            .and(header("Destination", "target"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "ok": true, "id": "target", "rev": "1-abc"
            })))
            .mount(&mock_server)
            .await;

        let db = couch(&mock_server).await.db("albums");
        db.copy_doc("source", "target").await.unwrap();
    }

    #[tokio::test]
    async fn test_view_options_on_query_string() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/albums/_design/music/_view/by-artist"))
            .and(query_param("key", "\"Ornette Coleman\""))
            .and(query_param("include_docs", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_rows": 1, "offset": 0, "rows": []
            })))
            .mount(&mock_server)
            .await;

        let db = couch(&mock_server).await.db("albums");
        let result = db
            .view(
                "music/by-artist",
                &ViewOptions::new()
                    .key(json!("Ornette Coleman"))
                    .include_docs(true),
            )
            .await
            .unwrap();
        assert_eq!(result.total_rows, Some(1));

        let err = db.view("no-slash", &ViewOptions::new()).await.unwrap_err();
        assert!(err.is_config());
    }

    #[tokio::test]
    async fn test_view_with_keys_switches_to_post() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/albums/_design/music/_view/by-artist"))
            .and(query_param("limit", "10"))
            .and(body_json(json!({ "keys": ["a", "b"] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_rows": 2, "offset": 0, "rows": []
            })))
            .mount(&mock_server)
            .await;

        let db = couch(&mock_server).await.db("albums");
        db.view(
            "music/by-artist",
            &ViewOptions::new().keys([json!("a"), json!("b")]).limit(10),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_all_design_docs_key_range() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/albums/_all_docs"))
            .and(query_param("startkey", "\"_design\""))
            .and(query_param("endkey", "\"_design0\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_rows": 0, "offset": 0, "rows": []
            })))
            .mount(&mock_server)
            .await;

        let db = couch(&mock_server).await.db("albums");
        db.all_design_docs(&ViewOptions::new()).await.unwrap();
    }

    #[tokio::test]
    async fn test_temp_view_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/albums/_temp_view"))
            .and(body_json(json!({
                "language": "javascript",
                "map": "function(doc) { emit(doc._id, null); }"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_rows": 0, "offset": 0, "rows": []
            })))
            .mount(&mock_server)
            .await;

        let db = couch(&mock_server).await.db("albums");
        db.temp_view("function(doc) { emit(doc._id, null); }", None, None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_compaction_endpoints_accept_202() {
        let mock_server = MockServer::start().await;
        for p in ["/albums/_compact", "/albums/_compact/music", "/albums/_view_cleanup"] {
            Mock::given(method("POST"))
                .and(path(p))
                .respond_with(ResponseTemplate::new(202).set_body_json(json!({ "ok": true })))
                .mount(&mock_server)
                .await;
        }

        let db = couch(&mock_server).await.db("albums");
        db.compact().await.unwrap();
        db.compact_view("music").await.unwrap();
        db.view_cleanup().await.unwrap();
    }

    #[tokio::test]
    async fn test_db_properties() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/albums/_revs_limit"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(1000)))
            .mount(&mock_server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/albums/_revs_limit"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .mount(&mock_server)
            .await;

        let db = couch(&mock_server).await.db("albums");
        assert_eq!(db.get_property("_revs_limit").await.unwrap(), json!(1000));
        db.set_property("_revs_limit", &json!(500)).await.unwrap();
    }
}
