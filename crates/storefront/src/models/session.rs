//! Session-stored shopper state.
//!
//! The cart and wishlist are stored together as one [`ShoppingSession`]
//! value so a mutation touching both is written in a single insert.

use storefront_cache_core::{Language, ShoppingSession};
use tower_sessions::Session;

/// Session keys.
pub mod keys {
    /// Key for the shopper's cart and wishlist.
    pub const SHOPPING: &str = "shopping";

    /// Key for the shopper's preferred language.
    pub const LANGUAGE: &str = "language";
}

/// Load the cart and wishlist, empty if absent.
///
/// # Errors
///
/// Returns an error if the session store fails or the value cannot be decoded.
pub async fn load_shopping(
    session: &Session,
) -> Result<ShoppingSession, tower_sessions::session::Error> {
    Ok(session
        .get::<ShoppingSession>(keys::SHOPPING)
        .await?
        .unwrap_or_default())
}

/// Replace the cart and wishlist.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn save_shopping(
    session: &Session,
    shopping: &ShoppingSession,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::SHOPPING, shopping).await
}

/// The shopper's language, defaulting to English.
///
/// Unreadable values fall back to the default rather than failing the page.
pub async fn load_language(session: &Session) -> Language {
    session
        .get::<Language>(keys::LANGUAGE)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Store the shopper's language.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn save_language(
    session: &Session,
    language: Language,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::LANGUAGE, language).await
}
