//! HTTP client for the iFast REST API.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use url::Url;

use crate::{request::ApiRequest, token::TokenStore, Error};

/// Base URL of a locally running backend.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Request timeout used unless the caller picks another one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("ifast/", env!("CARGO_PKG_VERSION"));

/// Single-attempt HTTP client for the iFast REST API.
///
/// Attaches `Authorization: Bearer <access>` to requests that need it when the
/// token store holds a pair, and classifies every response into either a
/// decoded value or an [`Error`]. It never retries; the refresh-and-retry
/// policy lives in [`crate::AuthService`].
///
/// Cloning is cheap: the underlying `reqwest::Client` and token store are shared.
#[derive(Clone)]
pub struct Client {
    /// Base URL for the API. Defaults to [`DEFAULT_BASE_URL`].
    base_api_url: String,
    http: reqwest::Client,
    tokens: Arc<dyn TokenStore>,
}

impl Client {
    /// Creates a client pointing at [`DEFAULT_BASE_URL`].
    pub fn new(tokens: Arc<dyn TokenStore>) -> Result<Self, Error> {
        Self::with_base_url(DEFAULT_BASE_URL, tokens)
    }

    /// Creates a client with a custom base URL. Used for testing with wiremock.
    pub fn with_base_url(base_url: &str, tokens: Arc<dyn TokenStore>) -> Result<Self, Error> {
        Self::with_timeout(base_url, tokens, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: &str,
        tokens: Arc<dyn TokenStore>,
        timeout: Duration,
    ) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                Error::Network(e.to_string())
            })?;
        Ok(Self {
            base_api_url: base_url.trim_end_matches('/').to_string(),
            http,
            tokens,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_api_url
    }

    /// The credential store this client reads bearer tokens from.
    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    fn get_url(&self, path: &str, query: &[(String, String)]) -> Result<Url, Error> {
        let separator = if path.starts_with('/') { "" } else { "/" };
        let mut url = Url::parse(&format!("{}{}{}", self.base_api_url, separator, path))
            .map_err(|e| {
                tracing::error!("Invalid URL constructed: {}", e);
                Error::InvalidUrl
            })?;
        if url.cannot_be_a_base() {
            tracing::error!("Invalid URL constructed: {} has no path segments", url);
            return Err(Error::InvalidUrl);
        }
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        Ok(url)
    }

    /// Sends `req` once and returns the body of a 2xx response.
    async fn execute(&self, req: &ApiRequest) -> Result<String, Error> {
        let url = self.get_url(&req.path, &req.query)?;
        tracing::debug!("{} {}", req.method, req.path);

        let mut builder = self
            .http
            .request(req.method.clone(), url)
            .header(ACCEPT, "application/json");

        if req.requires_auth {
            match self.tokens.load()? {
                Some(tokens) => builder = builder.header(AUTHORIZATION, tokens.bearer()),
                None => tracing::debug!("No stored tokens, sending {} unauthenticated", req.path),
            }
        }

        if let Some(body) = &req.body {
            let bytes = serde_json::to_vec(body).map_err(|e| {
                tracing::error!("Failed to encode request body: {}", e);
                Error::Decoding(format!("request body: {}", e))
            })?;
            builder = builder.header(CONTENT_TYPE, "application/json").body(bytes);
        }

        let resp = builder.send().await.map_err(|e| {
            tracing::error!("Failed to send {} {}: {}", req.method, req.path, e);
            Error::Network(e.to_string())
        })?;

        let status = resp.status();
        // A 401 body is never inspected, so a truncated one must not mask it.
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("{} {} answered 401", req.method, req.path);
            return Err(Error::Unauthorized);
        }

        let body = resp.text().await.map_err(|e| {
            tracing::error!("Failed to read response body: {}", e);
            Error::Network(e.to_string())
        })?;

        if !status.is_success() {
            let snippet = truncate_body(&body);
            tracing::error!("Request failed with status {}: {}", status, snippet);
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: snippet,
            });
        }

        Ok(body)
    }

    /// Sends `req` once and decodes a 2xx JSON body into `T`.
    pub async fn perform<T: DeserializeOwned>(&self, req: &ApiRequest) -> Result<T, Error> {
        let body = self.execute(req).await?;
        serde_json::from_str::<T>(&body).map_err(|e| {
            let snippet = truncate_body(&body);
            tracing::error!("Failed to parse resource: {} | body: {}", e, snippet);
            Error::Decoding(e.to_string())
        })
    }

    /// Sends `req` once and returns the raw 2xx body without JSON parsing.
    pub async fn perform_text(&self, req: &ApiRequest) -> Result<String, Error> {
        self.execute(req).await
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 2000;
    if body.len() <= MAX {
        return body.to_string();
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...[truncated]", &body[..end])
}
