//! Cached and served response shapes.

use core::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::origin::OriginResponse;

/// Response header carrying the [`CacheStatus`].
pub const SWR_CACHE_HEADER: &str = "X-SWR-Cache";

/// How a response was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Served from cache while the freshness marker was alive.
    Hit,
    /// Served from cache after the marker expired; a refresh was scheduled.
    Stale,
    /// Fetched from the origin.
    Miss,
}

impl CacheStatus {
    /// Header value for this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::Stale => "stale",
            Self::Miss => "miss",
        }
    }
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted form of a 200 response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    #[serde(with = "base64_body")]
    pub body: Bytes,
}

impl From<&OriginResponse> for CachedResponse {
    fn from(response: &OriginResponse) -> Self {
        Self {
            status: response.status,
            status_text: response.status_text.clone(),
            headers: response.headers.clone(),
            body: response.body.clone(),
        }
    }
}

mod base64_body {
    use super::{Bytes, Deserialize, Deserializer, Engine, STANDARD, Serializer};

    pub fn serialize<S: Serializer>(body: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(body))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded)
            .map(Bytes::from)
            .map_err(serde::de::Error::custom)
    }
}

/// A response returned by [`SwrCache::fetch`](super::SwrCache::fetch).
///
/// The header list always contains exactly one [`SWR_CACHE_HEADER`] entry.
#[derive(Debug, Clone)]
pub struct SwrResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    pub cache_status: CacheStatus,
}

impl SwrResponse {
    pub(crate) fn from_cached(cached: CachedResponse, cache_status: CacheStatus) -> Self {
        Self::annotated(
            cached.status,
            cached.status_text,
            cached.headers,
            cached.body,
            cache_status,
        )
    }

    pub(crate) fn from_origin(response: OriginResponse, cache_status: CacheStatus) -> Self {
        Self::annotated(
            response.status,
            response.status_text,
            response.headers,
            response.body,
            cache_status,
        )
    }

    fn annotated(
        status: u16,
        status_text: String,
        mut headers: Vec<(String, String)>,
        body: Bytes,
        cache_status: CacheStatus,
    ) -> Self {
        headers.retain(|(name, _)| !name.eq_ignore_ascii_case(SWR_CACHE_HEADER));
        headers.push((SWR_CACHE_HEADER.to_owned(), cache_status.as_str().to_owned()));
        Self {
            status,
            status_text,
            headers,
            body,
            cache_status,
        }
    }

    /// Look up a header value, ignoring name case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Whether the status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Decode the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}
