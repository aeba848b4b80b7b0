//! # couch-http
//!
//! Core HTTP infrastructure for CouchDB clients.
//!
//! This crate provides the request/response engine shared by the higher-level
//! API crate:
//! - URL, query-string, and document-id encoding with CouchDB's special cases
//! - Request composition: defaults, query-string relocation for GET/DELETE,
//!   header and Basic-auth handling
//! - One-shot transport over `reqwest` with redirects disabled
//! - Response dispatch: content-type negotiation, JSON parsing, and
//!   per-request acceptable-status checking
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Application Layer                        │
//! │  (couch-api: server ops, Database, views, signup)           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      RequestSpec                            │
//! │  - Method, URL, tagged body (raw text vs. JSON value)       │
//! │  - Acceptable-status set, credentials, extra headers        │
//! │  - resolve(): deterministic composition into a wire request │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      HttpClient                             │
//! │  - Single request, single terminal outcome, no retries      │
//! │  - Dispatch: parse body, check status, Ok or typed Err      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use couch_http::{HttpClient, RequestSpec};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), couch_http::Error> {
//!     let client = HttpClient::default_client()?;
//!
//!     let dbs: Vec<String> = client
//!         .execute(&RequestSpec::get("http://localhost:5984/_all_dbs"))
//!         .await?
//!         .decode()?;
//!
//!     Ok(())
//! }
//! ```

mod client;
mod config;
pub mod encode;
mod error;
mod request;
mod response;

pub use client::HttpClient;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{Error, ErrorKind, Result};
pub use request::{Body, Credentials, Method, RequestSpec, ResolvedRequest};
pub use response::CouchResponse;

/// User-Agent string for the client
pub const USER_AGENT: &str = concat!("couchdb-client/", env!("CARGO_PKG_VERSION"));
