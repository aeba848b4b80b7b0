//! # couchdb-client
//!
//! A CouchDB HTTP API client library for Rust.
//!
//! This library turns logical database operations (list databases, manage
//! configuration, authenticate, document CRUD, views, bulk operations) into
//! correctly-encoded HTTP requests and dispatches each response against the
//! operation's acceptable-status set.
//!
//! ## Crates
//!
//! - **couch-http** - Request composition, encoding primitives, one-shot
//!   transport, response dispatch
//! - **couch-api** - Operation facade: server operations, `Database`
//!   handles, views, sessions, user signup
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use couchdb_client::api::{CouchClient, ViewOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let couch = CouchClient::new("http://localhost:5984")?;
//!
//!     for name in couch.all_dbs().await? {
//!         println!("{name}");
//!     }
//!
//!     let db = couch.db("albums");
//!     db.save_doc(&serde_json::json!({ "artist": "Hank Mobley" }))
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

// Re-export both crates for convenient access
pub use couch_api as api;
pub use couch_http as http;
