//! # couch-api
//!
//! CouchDB API client built on `couch-http`.
//!
//! [`CouchClient`] covers server-level operations (database listing, server
//! configuration, sessions and authentication, user signup) and hands out
//! [`Database`] values for per-database work: document CRUD, bulk
//! operations, views and temporary views, compaction, and database
//! properties.
//!
//! ## Example
//!
//! ```rust,ignore
//! use couch_api::{CouchClient, ViewOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), couch_api::Error> {
//!     let couch = CouchClient::new("http://localhost:5984")?;
//!
//!     let db = couch.db("albums");
//!     db.create().await?;
//!
//!     let saved = db
//!         .save_doc(&serde_json::json!({ "artist": "Ornette Coleman" }))
//!         .await?;
//!
//!     let rows = db
//!         .view("music/by-artist", &ViewOptions::new().include_docs(true))
//!         .await?;
//!     println!("{} rows, first id {:?}", rows.rows.len(), saved.id);
//!
//!     Ok(())
//! }
//! ```

mod client;
mod db;
mod types;
mod users;
mod view;

pub use client::CouchClient;
pub use db::Database;
pub use types::{DatabaseInfo, DocumentResponse, SessionInfo, SessionResponse, UserContext};
pub use view::{Stale, ViewOptions, ViewResult, ViewRow};

// The error surface is couch-http's: the facade adds no failure modes of
// its own beyond ErrorKind::Config.
pub use couch_http::{ClientConfig, Credentials, Error, ErrorKind, Result};
