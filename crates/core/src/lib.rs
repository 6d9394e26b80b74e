//! Storefront cache core - shared primitives.
//!
//! This crate provides the pure building blocks used by the storefront
//! service and its tooling:
//! - `storefront` - SWR response cache, image transform cache, HTTP surface
//! - `cli` - Cache key inspection and image cache maintenance
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! async runtime, no HTTP clients. Everything here is deterministic so it
//! can be used for durable storage keys and unit-tested in isolation.
//!
//! # Modules
//!
//! - [`cache_key`] - Stable SHA-256 cache keys for requests and image transforms
//! - [`line_item`] - Cart and wishlist reducers
//! - [`types`] - Newtype identifiers, quantities, money, and language

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cache_key;
pub mod line_item;
pub mod types;

pub use cache_key::{CacheKey, CacheKeyBuilder, IMAGE_KEY_VERSION, image_key, request_key};
pub use line_item::{CartItem, ShoppingSession, WishlistItem};
pub use types::*;
