//! Upstream transport for cacheable requests.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Method;
use storefront_cache_core::{CacheKey, request_key};
use thiserror::Error;
use tracing::instrument;

/// Errors reaching the origin.
#[derive(Debug, Error)]
pub enum OriginError {
    /// HTTP transport failed.
    #[error("origin request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The origin could not be used for another reason.
    #[error("origin unavailable: {0}")]
    Unavailable(String),
}

/// An outbound request as seen by the cache.
///
/// Headers are kept as an ordered list because their order is part of the
/// cache key.
#[derive(Debug, Clone)]
pub struct OriginRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
}

impl OriginRequest {
    /// Create a request with no headers or body.
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Append a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the request body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Stable key identifying this request.
    #[must_use]
    pub fn cache_key(&self) -> CacheKey {
        request_key(
            self.method.as_str(),
            &self.url,
            self.headers
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str())),
            self.body.as_deref(),
        )
    }
}

/// A fully buffered origin response.
#[derive(Debug, Clone)]
pub struct OriginResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl OriginResponse {
    /// Create a response with no headers.
    #[must_use]
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            status_text: String::new(),
            headers: Vec::new(),
            body: body.into(),
        }
    }
}

/// Something that can answer an [`OriginRequest`].
#[async_trait]
pub trait Origin: Send + Sync + 'static {
    /// Perform the request and buffer the whole response.
    async fn fetch(&self, request: &OriginRequest) -> Result<OriginResponse, OriginError>;
}

/// [`Origin`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpOrigin {
    client: reqwest::Client,
}

impl HttpOrigin {
    /// Wrap an existing client.
    #[must_use]
    pub const fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Origin for HttpOrigin {
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn fetch(&self, request: &OriginRequest) -> Result<OriginResponse, OriginError> {
        let mut builder = self.client.request(request.method.clone(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_owned(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.bytes().await?;

        Ok(OriginResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_owned(),
            headers,
            body,
        })
    }
}
