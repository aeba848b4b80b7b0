//! Error types for couch-http.

/// Result type alias for couch-http operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for couch-http operations.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional source error.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Create a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    /// Create a new error with the given kind and source.
    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }

    /// Returns true if the server responded with a status outside the
    /// request's acceptable set.
    pub fn is_status(&self) -> bool {
        matches!(self.kind, ErrorKind::Status { .. })
    }

    /// Returns the HTTP status if this is a status error.
    pub fn status(&self) -> Option<u16> {
        match &self.kind {
            ErrorKind::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if no response was obtained at all.
    pub fn is_transport(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Timeout | ErrorKind::Connection(_) | ErrorKind::Transport(_)
        )
    }

    /// Returns true if this error was raised before any network activity.
    pub fn is_config(&self) -> bool {
        matches!(self.kind, ErrorKind::Config(_) | ErrorKind::InvalidUrl(_))
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// The response status was not in the request's acceptable set. An
    /// unexpected redirect lands here as well; redirects are never followed.
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Connection error.
    #[error("connection error: {0}")]
    Connection(String),

    /// Transport failed without producing a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body did not match its negotiated content type.
    #[error("parse error: {message}")]
    Parse { message: String, body: String },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(String),

    /// Invalid URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid configuration; raised before any network activity.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ErrorKind::Timeout
        } else if err.is_connect() {
            ErrorKind::Connection(err.to_string())
        } else {
            ErrorKind::Transport(err.to_string())
        };

        Error::with_source(kind, err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Json(err.to_string()), err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::with_source(ErrorKind::InvalidUrl(err.to_string()), err)
    }
}
