//! On-disk image transform cache.
//!
//! Serves `/api/image?src=..&width=..&height=..&fit=..`. Each distinct
//! request is transformed once, re-encoded as WebP and written to
//! `<cache_dir>/<key>.webp`; later requests stream that file. Failures of any
//! kind degrade to a 1x1 placeholder GIF instead of an error page.
//!
//! Cached files never expire by time. Prune the directory externally (see
//! `sc-cli images prune`).

mod cache;
mod error;
mod fetch;
mod placeholder;
mod query;
mod transform;

pub use cache::{ImageBody, ImageCache, ImageResponse};
pub use error::ImageCacheError;
pub use fetch::{DefaultSourceFetcher, SourceFetcher, is_local_src};
pub use placeholder::PLACEHOLDER_GIF;
pub use query::{Fit, ImageQuery, ImageQueryParams, MAX_IMAGE_DIMENSION, image_url};
pub use transform::transform;

/// Route the image cache is mounted on.
pub const IMAGE_ROUTE: &str = "/api/image";

/// Response header reporting whether the transformed file already existed
/// (`hit` or `miss`).
pub const IMAGE_CACHE_HEADER: &str = "x-image-cache";

/// `Cache-Control` for transformed images.
pub const IMMUTABLE_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";
