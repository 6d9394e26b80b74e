//! Stable cache keys.
//!
//! Keys are SHA-256 digests over an ordered list of byte components and are
//! used as durable storage keys, so they carry no process-local salt. Each
//! component is length-prefixed before hashing, which makes component
//! boundaries part of the identity: `["ab", "c"]` and `["a", "bc"]` never
//! collide.
//!
//! Header order is significant. Two requests that differ only in the order
//! of their headers produce different keys.

use core::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Version tag mixed into every image transform key.
///
/// Bumping it moves all image transforms to a fresh key space.
pub const IMAGE_KEY_VERSION: &str = "v1";

/// A hex-encoded SHA-256 cache key (64 lowercase characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Borrow the hex digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Incremental builder for a [`CacheKey`].
///
/// ```rust
/// use storefront_cache_core::CacheKeyBuilder;
///
/// let a = CacheKeyBuilder::new().component("get").component("https://a").finish();
/// let b = CacheKeyBuilder::new().component("get").component("https://a").finish();
/// assert_eq!(a, b);
/// assert_eq!(a.as_str().len(), 64);
/// ```
#[derive(Clone, Default)]
pub struct CacheKeyBuilder {
    hasher: Sha256,
}

impl fmt::Debug for CacheKeyBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheKeyBuilder").finish_non_exhaustive()
    }
}

impl CacheKeyBuilder {
    /// Start a new key.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one component.
    #[must_use]
    pub fn component(mut self, bytes: impl AsRef<[u8]>) -> Self {
        let bytes = bytes.as_ref();
        self.hasher.update((bytes.len() as u64).to_be_bytes());
        self.hasher.update(bytes);
        self
    }

    /// Finish hashing and hex-encode the digest.
    #[must_use]
    pub fn finish(self) -> CacheKey {
        CacheKey(format!("{:x}", self.hasher.finalize()))
    }
}

/// Derive the key for an outbound HTTP request.
///
/// The method is lowercased. The body only participates for methods other
/// than `GET` and `HEAD`, and only when present.
#[must_use]
pub fn request_key<'a, I>(method: &str, url: &str, headers: I, body: Option<&[u8]>) -> CacheKey
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let method = method.to_ascii_lowercase();
    let mut builder = CacheKeyBuilder::new().component(&method).component(url);

    for (name, value) in headers {
        builder = builder.component(name).component(value);
    }

    if method != "get"
        && method != "head"
        && let Some(body) = body
    {
        builder = builder.component(body);
    }

    builder.finish()
}

/// Derive the key for an image transform request.
///
/// Only the request parameters are hashed, never the source bytes: a source
/// asset that changes in place keeps serving the previously transformed file
/// until the key space changes.
#[must_use]
pub fn image_key(
    method: &str,
    request_url: &str,
    width: Option<u32>,
    height: Option<u32>,
    fit: &str,
) -> CacheKey {
    CacheKeyBuilder::new()
        .component(IMAGE_KEY_VERSION)
        .component(method)
        .component(request_url)
        .component(width.unwrap_or(0).to_string())
        .component(height.unwrap_or(0).to_string())
        .component(fit)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://shop.myshopify.com/api/2021-10/graphql.json";

    fn headers() -> Vec<(&'static str, &'static str)> {
        vec![
            ("accept-language", "en"),
            ("content-type", "application/json"),
        ]
    }

    #[test]
    fn test_request_key_is_deterministic() {
        let a = request_key("POST", URL, headers(), Some(b"{\"query\":1}".as_slice()));
        let b = request_key("POST", URL, headers(), Some(b"{\"query\":1}".as_slice()));
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_method_case_does_not_matter() {
        let a = request_key("POST", URL, headers(), Some(b"x".as_slice()));
        let b = request_key("post", URL, headers(), Some(b"x".as_slice()));
        assert_eq!(a, b);
    }

    #[test]
    fn test_each_field_changes_key() {
        let base = request_key("POST", URL, headers(), Some(b"x".as_slice()));

        assert_ne!(base, request_key("PUT", URL, headers(), Some(b"x".as_slice())));
        assert_ne!(
            base,
            request_key("POST", "https://other.example/graphql", headers(), Some(b"x".as_slice()))
        );
        assert_ne!(
            base,
            request_key(
                "POST",
                URL,
                vec![("accept-language", "es"), ("content-type", "application/json")],
                Some(b"x".as_slice()),
            )
        );
        assert_ne!(base, request_key("POST", URL, headers(), Some(b"y".as_slice())));
        assert_ne!(base, request_key("POST", URL, headers(), None));
    }

    #[test]
    fn test_header_order_matters() {
        let mut reversed = headers();
        reversed.reverse();
        assert_ne!(
            request_key("GET", URL, headers(), None),
            request_key("GET", URL, reversed, None)
        );
    }

    #[test]
    fn test_get_ignores_body() {
        assert_eq!(
            request_key("GET", URL, headers(), Some(b"ignored".as_slice())),
            request_key("GET", URL, headers(), None)
        );
        assert_eq!(
            request_key("HEAD", URL, headers(), Some(b"ignored".as_slice())),
            request_key("HEAD", URL, headers(), None)
        );
    }

    #[test]
    fn test_component_boundaries_are_significant() {
        let a = CacheKeyBuilder::new().component("ab").component("c").finish();
        let b = CacheKeyBuilder::new().component("a").component("bc").finish();
        assert_ne!(a, b);
    }

    #[test]
    fn test_image_key_varies_with_parameters() {
        let url = "http://localhost/api/image?src=a.jpg&width=480&height=480";
        let base = image_key("GET", url, Some(480), Some(480), "cover");

        assert_eq!(base, image_key("GET", url, Some(480), Some(480), "cover"));
        assert_ne!(base, image_key("GET", url, Some(480), Some(480), "contain"));
        assert_ne!(base, image_key("GET", url, Some(240), Some(480), "cover"));
        assert_ne!(base, image_key("GET", url, None, Some(480), "cover"));
        assert_ne!(base, image_key("HEAD", url, Some(480), Some(480), "cover"));
    }
}
