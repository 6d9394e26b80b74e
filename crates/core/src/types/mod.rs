//! Core types for the storefront cache service.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod language;
pub mod price;
pub mod quantity;

pub use id::*;
pub use language::Language;
pub use price::{Money, PriceError};
pub use quantity::Quantity;
