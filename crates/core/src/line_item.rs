//! Cart and wishlist reducers.
//!
//! Pure functions over small, insertion-ordered lists of line items. Identity
//! is the variant ID for both lists; wishlist items also carry the product ID
//! they were added from. Linear scans are fine here because list sizes are
//! bounded by what one shopper adds by hand.

use serde::{Deserialize, Serialize};

use crate::types::{ProductId, Quantity, VariantId};

/// A cart line, one per variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub variant_id: VariantId,
    pub quantity: Quantity,
}

impl CartItem {
    /// Create a cart line.
    #[must_use]
    pub const fn new(variant_id: VariantId, quantity: Quantity) -> Self {
        Self {
            variant_id,
            quantity,
        }
    }
}

/// A wishlist line, deduplicated on variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub quantity: Quantity,
}

impl WishlistItem {
    /// Create a wishlist line.
    #[must_use]
    pub const fn new(product_id: ProductId, variant_id: VariantId, quantity: Quantity) -> Self {
        Self {
            product_id,
            variant_id,
            quantity,
        }
    }
}

/// Add `delta` to the matching cart line, or append a new line.
#[must_use]
pub fn add_to_cart(mut cart: Vec<CartItem>, variant_id: &VariantId, delta: i64) -> Vec<CartItem> {
    if let Some(item) = cart.iter_mut().find(|item| &item.variant_id == variant_id) {
        item.quantity = item.quantity.apply_delta(delta);
    } else {
        cart.push(CartItem::new(variant_id.clone(), Quantity::clamped(delta)));
    }
    cart
}

/// Overwrite the matching cart line's quantity, or append a new line.
#[must_use]
pub fn update_cart_item(
    mut cart: Vec<CartItem>,
    variant_id: &VariantId,
    quantity: i64,
) -> Vec<CartItem> {
    let quantity = Quantity::clamped(quantity);
    if let Some(item) = cart.iter_mut().find(|item| &item.variant_id == variant_id) {
        item.quantity = quantity;
    } else {
        cart.push(CartItem::new(variant_id.clone(), quantity));
    }
    cart
}

/// Drop the matching cart line.
#[must_use]
pub fn remove_cart_item(mut cart: Vec<CartItem>, variant_id: &VariantId) -> Vec<CartItem> {
    cart.retain(|item| &item.variant_id != variant_id);
    cart
}

/// Add `delta` to the matching wishlist line, or append a new line.
#[must_use]
pub fn add_to_wishlist(
    mut wishlist: Vec<WishlistItem>,
    product_id: &ProductId,
    variant_id: &VariantId,
    delta: i64,
) -> Vec<WishlistItem> {
    if let Some(item) = wishlist
        .iter_mut()
        .find(|item| &item.variant_id == variant_id)
    {
        item.quantity = item.quantity.apply_delta(delta);
    } else {
        wishlist.push(WishlistItem::new(
            product_id.clone(),
            variant_id.clone(),
            Quantity::clamped(delta),
        ));
    }
    wishlist
}

/// Overwrite the matching wishlist line's quantity, or append a new line.
///
/// An existing line keeps the product ID it was added with.
#[must_use]
pub fn update_wishlist_item(
    mut wishlist: Vec<WishlistItem>,
    product_id: &ProductId,
    variant_id: &VariantId,
    quantity: i64,
) -> Vec<WishlistItem> {
    let quantity = Quantity::clamped(quantity);
    if let Some(item) = wishlist
        .iter_mut()
        .find(|item| &item.variant_id == variant_id)
    {
        item.quantity = quantity;
    } else {
        wishlist.push(WishlistItem::new(
            product_id.clone(),
            variant_id.clone(),
            quantity,
        ));
    }
    wishlist
}

/// Drop the matching wishlist line.
#[must_use]
pub fn remove_wishlist_item(
    mut wishlist: Vec<WishlistItem>,
    variant_id: &VariantId,
) -> Vec<WishlistItem> {
    wishlist.retain(|item| &item.variant_id != variant_id);
    wishlist
}

/// Cart and wishlist persisted together.
///
/// Both lists live in one value so compound mutations such as
/// [`ShoppingSession::move_to_cart`] are committed in a single write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShoppingSession {
    #[serde(default)]
    pub cart: Vec<CartItem>,
    #[serde(default)]
    pub wishlist: Vec<WishlistItem>,
}

impl ShoppingSession {
    /// Move a wishlist line into the cart.
    ///
    /// The cart line ends up with its existing quantity (if any) plus the
    /// wishlist quantity, and the wishlist line is removed. Returns `None`,
    /// leaving nothing changed, when the variant is not on the wishlist.
    #[must_use]
    pub fn move_to_cart(self, variant_id: &VariantId) -> Option<Self> {
        let wished = self
            .wishlist
            .iter()
            .find(|item| &item.variant_id == variant_id)?
            .quantity;

        let existing = self
            .cart
            .iter()
            .find(|item| &item.variant_id == variant_id)
            .map_or(0, |item| i64::from(item.quantity.get()));

        Some(Self {
            cart: update_cart_item(
                self.cart,
                variant_id,
                i64::from(wished.get()) + existing,
            ),
            wishlist: remove_wishlist_item(self.wishlist, variant_id),
        })
    }

    /// Total number of units in the cart.
    #[must_use]
    pub fn cart_count(&self) -> u64 {
        self.cart
            .iter()
            .map(|item| u64::from(item.quantity.get()))
            .sum()
    }
}
