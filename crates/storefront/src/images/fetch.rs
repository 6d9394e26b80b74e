//! Source image retrieval.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::instrument;
use url::Url;

use super::ImageCacheError;

/// Loads the original bytes for an image `src`.
#[async_trait]
pub trait SourceFetcher: Send + Sync + 'static {
    /// Fetch the full source image.
    async fn fetch(&self, src: &str) -> Result<Bytes, ImageCacheError>;
}

/// Whether `src` names a file under the public directory.
///
/// Root-relative paths (`/img/a.png`) are local; protocol-relative URLs
/// (`//cdn/a.png`) are not.
#[must_use]
pub fn is_local_src(src: &str) -> bool {
    src.starts_with('/') && !src.starts_with("//")
}

/// Reads root-relative sources from disk and everything else over HTTP.
#[derive(Debug, Clone)]
pub struct DefaultSourceFetcher {
    public_dir: PathBuf,
    client: reqwest::Client,
}

impl DefaultSourceFetcher {
    /// Create a fetcher.
    #[must_use]
    pub fn new(public_dir: impl Into<PathBuf>, client: reqwest::Client) -> Self {
        Self {
            public_dir: public_dir.into(),
            client,
        }
    }

    /// Resolve a root-relative `src` inside the public directory.
    ///
    /// Rejects anything that would leave it (`..`, absolute components).
    ///
    /// # Errors
    ///
    /// Returns [`ImageCacheError::InvalidPath`] for escaping paths.
    pub fn resolve_local(&self, src: &str) -> Result<PathBuf, ImageCacheError> {
        let relative = Path::new(src.trim_start_matches('/'));

        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes || relative.as_os_str().is_empty() {
            return Err(ImageCacheError::InvalidPath(src.to_owned()));
        }

        Ok(self.public_dir.join(relative))
    }
}

#[async_trait]
impl SourceFetcher for DefaultSourceFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, src: &str) -> Result<Bytes, ImageCacheError> {
        if is_local_src(src) {
            let path = self.resolve_local(src)?;
            return Ok(tokio::fs::read(path).await?.into());
        }

        let url = remote_url(src)?;
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ImageCacheError::UpstreamStatus(status.as_u16()));
        }

        Ok(response.bytes().await?)
    }
}

/// Parse a remote `src`, accepting only `http` and `https`.
fn remote_url(src: &str) -> Result<Url, ImageCacheError> {
    let url = Url::parse(src).map_err(|_| ImageCacheError::UnsupportedSource(src.to_owned()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(ImageCacheError::UnsupportedSource(src.to_owned())),
    }
}
