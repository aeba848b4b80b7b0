//! One-shot HTTP transport over reqwest, with redirects disabled.

use std::collections::BTreeMap;

use tracing::{debug, info, instrument};

use crate::config::ClientConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::request::RequestSpec;
use crate::response::{self, CouchResponse};

/// HTTP client executing composed CouchDB requests.
///
/// Each call performs exactly one request and produces exactly one terminal
/// outcome; there are no retries and no cancellation. Redirects are never
/// followed: a 3xx response is checked against the request's acceptable
/// status set like any other status.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    config: ClientConfig,
}

impl HttpClient {
    /// Create a new HTTP client with the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| Error::with_source(ErrorKind::Config(e.to_string()), e))?;

        Ok(Self { inner, config })
    }

    /// Create a new HTTP client with default configuration.
    pub fn default_client() -> Result<Self> {
        Self::new(ClientConfig::default())
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Compose and execute a request, dispatching its terminal outcome.
    #[instrument(skip(self, spec), fields(method = %spec.method(), url = %spec.url()))]
    pub async fn execute(&self, spec: &RequestSpec) -> Result<CouchResponse> {
        let request = spec.resolve();

        let mut req = self.inner.request(request.method.to_reqwest(), &request.url);
        for (name, value) in &request.headers {
            req = req.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            req = req.body(body);
        }

        if self.config.enable_tracing {
            debug!(method = %request.method, url = %request.url, "sending request");
        }

        let response = req.send().await?;
        let status = response.status().as_u16();
        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let raw_body = response.text().await?;

        if self.config.enable_tracing {
            if request.success_statuses.contains(&status) {
                debug!(status, "response received");
            } else {
                info!(status, "non-success response");
            }
        }

        response::dispatch(status, headers, raw_body, &request.success_statuses)
    }
}
