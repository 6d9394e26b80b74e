//! Image cache errors.

use thiserror::Error;

/// Errors on the image miss path.
///
/// None of these reach the client; [`ImageCache::serve`](super::ImageCache::serve)
/// logs them and answers with the placeholder.
#[derive(Debug, Error)]
pub enum ImageCacheError {
    /// Upstream fetch failed at the transport level.
    #[error("source fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    /// Upstream answered with a non-success status.
    #[error("source returned status {0}")]
    UpstreamStatus(u16),

    /// A remote source is not an absolute `http(s)` URL.
    #[error("unsupported image source: {0}")]
    UnsupportedSource(String),

    /// A local source escaped the public directory.
    #[error("invalid local source path: {0}")]
    InvalidPath(String),

    /// Filesystem read or write failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Decode or encode failed.
    #[error("image processing failed: {0}")]
    Image(#[from] image::ImageError),

    /// The blocking transform task did not complete.
    #[error("transform task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
