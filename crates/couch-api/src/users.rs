//! User-document preparation for signup.
//!
//! CouchDB stores users as documents in the authentication database
//! (normally `_users`) with ids of the form `org.couchdb.user:<name>` and,
//! in the legacy scheme, a `password_sha` of sha1(password + salt).
//!
//! Hashing needs the `signup` feature; without it, preparing a document
//! with a password fails with a configuration error before any network
//! activity.

use serde_json::Value;

use couch_http::{Error, ErrorKind, Result};

const USER_PREFIX: &str = "org.couchdb.user:";

/// Build a `_users` document from caller-supplied fields.
///
/// Fills in `_id`, `type`, and default `roles` if missing; when a new
/// password is given, generates a fresh salt and the matching
/// `password_sha`.
pub(crate) fn prepare_user_doc(mut doc: Value, new_password: Option<&str>) -> Result<Value> {
    let fields = doc
        .as_object_mut()
        .ok_or_else(|| Error::new(ErrorKind::Config("user document must be a JSON object".into())))?;

    let name = fields
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            Error::new(ErrorKind::Config(
                "user document requires a string `name` field".into(),
            ))
        })?
        .to_string();

    if !fields.contains_key("_id") {
        fields.insert("_id".to_string(), Value::String(format!("{USER_PREFIX}{name}")));
    }

    if let Some(password) = new_password {
        let (salt, password_sha) = hash_password(password)?;
        fields.insert("salt".to_string(), Value::String(salt));
        fields.insert("password_sha".to_string(), Value::String(password_sha));
    }

    fields.insert("type".to_string(), Value::String("user".to_string()));
    fields
        .entry("roles")
        .or_insert_with(|| Value::Array(Vec::new()));

    Ok(doc)
}

#[cfg(feature = "signup")]
fn hash_password(password: &str) -> Result<(String, String)> {
    use sha1::{Digest, Sha1};

    let salt = uuid::Uuid::new_v4().simple().to_string();
    let digest = Sha1::digest(format!("{password}{salt}").as_bytes());
    let password_sha = digest
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<String>();
    Ok((salt, password_sha))
}

#[cfg(not(feature = "signup"))]
fn hash_password(_password: &str) -> Result<(String, String)> {
    Err(Error::new(ErrorKind::Config(
        "password hashing requires the `signup` feature".into(),
    )))
}
