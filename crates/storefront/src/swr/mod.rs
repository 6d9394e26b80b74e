//! Stale-while-revalidate cache for outbound provider requests.
//!
//! # Architecture
//!
//! - [`KeyValueStore`] - pluggable string store (in-memory `moka` by default)
//! - [`Origin`] - the upstream HTTP transport (`reqwest` by default)
//! - [`SwrCache`] - serves cached bodies immediately and refreshes stale
//!   entries in the background
//!
//! # Storage layout
//!
//! ```text
//! swr:response:<key>    serialized CachedResponse, no expiry
//! swr:stillgood:<key>   "true", expires after max-age
//! ```
//!
//! The response body outlives its freshness marker: once the marker expires
//! the body is still served (annotated `stale`) while a refresh runs.

mod cache;
mod origin;
mod response;
mod store;

pub use cache::{MaxAge, SwrCache};
pub use origin::{HttpOrigin, Origin, OriginError, OriginRequest, OriginResponse};
pub use response::{CacheStatus, CachedResponse, SWR_CACHE_HEADER, SwrResponse};
pub use store::{KeyValueStore, MemoryStore, StoreError};

/// Key prefix for persisted responses.
pub const RESPONSE_PREFIX: &str = "swr:response:";

/// Key prefix for freshness markers.
pub const STILL_GOOD_PREFIX: &str = "swr:stillgood:";
