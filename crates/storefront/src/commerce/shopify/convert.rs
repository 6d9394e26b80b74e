//! Conversions from Shopify response shapes to provider view types.

use std::collections::HashMap;

use rust_decimal::Decimal;
use storefront_cache_core::{
    CartItem, Money, PriceError, ProductId, Quantity, VariantId, WishlistItem,
};

use super::data::{MoneyV2, ProductCard, ProductConnection, ProductDetail, VariantLookup};
use crate::commerce::{
    CALCULATED_AT_CHECKOUT, CartInfo, FullCartItem, FullProduct, FullWishlistItem, Product,
    ProductOption, ProductsPage, SelectedOption,
};

/// `$<amount> <currency>`, amount as sent by the backend.
pub fn format_price(money: &MoneyV2) -> String {
    format!("${} {}", money.amount, money.currency_code)
}

pub fn convert_product_card(card: ProductCard) -> Product {
    Product {
        id: ProductId::new(card.id),
        default_variant_id: card.variants.first().map(|v| VariantId::new(v.id.as_str())),
        title: card.title,
        formatted_price: format_price(&card.price_range.min_variant_price),
        formatted_options: None,
        image: card.images.first().map(|img| img.original_src.clone()),
        slug: card.handle,
        favorited: false,
    }
}

/// The next-page cursor is the cursor of the last edge.
pub fn convert_product_connection(connection: ProductConnection) -> ProductsPage {
    let next_page_cursor = connection
        .edges
        .last()
        .and_then(|edge| edge.cursor.clone());

    ProductsPage {
        products: connection
            .edges
            .into_iter()
            .map(|edge| convert_product_card(edge.node))
            .collect(),
        has_next_page: connection.page_info.has_next_page,
        next_page_cursor,
    }
}

/// Build a product page, picking the variant that matches `selected`.
///
/// A variant matches when every one of its options is selected with the same
/// value. Selections for option names the product does not have are
/// ignored. Without a match the product is unavailable and priced from its
/// minimum variant price.
pub fn convert_product_detail(detail: ProductDetail, selected: &[SelectedOption]) -> FullProduct {
    let option_names: Vec<&str> = detail.options.iter().map(|o| o.name.as_str()).collect();
    let chosen: HashMap<&str, &str> = selected
        .iter()
        .filter(|option| option_names.contains(&option.name.as_str()))
        .map(|option| (option.name.as_str(), option.value.as_str()))
        .collect();

    let default_variant_id = detail.variants.first().map(|v| VariantId::new(v.id.as_str()));
    let mut selected_variant_id = None;
    let mut available_for_sale = false;
    let mut price = &detail.price_range.min_variant_price;

    for variant in detail.variants.edges.iter().map(|edge| &edge.node) {
        let matches = variant
            .selected_options
            .iter()
            .all(|option| chosen.get(option.name.as_str()) == Some(&option.value.as_str()));
        if matches {
            selected_variant_id = Some(VariantId::new(variant.id.as_str()));
            available_for_sale = variant.available_for_sale;
            price = &variant.price_v2;
        }
    }

    let formatted_price = format_price(price);
    let images: Vec<String> = detail
        .images
        .into_nodes()
        .map(|img| img.original_src)
        .collect();

    FullProduct {
        product: Product {
            id: ProductId::new(detail.id),
            default_variant_id,
            title: detail.title,
            formatted_price,
            formatted_options: None,
            image: images.first().cloned(),
            slug: detail.handle,
            favorited: false,
        },
        description: detail.description,
        description_html: detail.description_html,
        images,
        available_for_sale,
        selected_variant_id,
        options: detail
            .options
            .into_iter()
            .map(|o| ProductOption {
                name: o.name,
                values: o.values,
            })
            .collect(),
    }
}

/// Product summary for a resolved variant, or `None` for non-variant nodes.
fn variant_info(node: &VariantLookup) -> Option<(Product, &MoneyV2)> {
    let price = node.price_v2.as_ref()?;
    let product = node.product.as_ref()?;

    let image = node
        .image
        .as_ref()
        .map(|img| img.original_src.clone())
        .or_else(|| product.images.first().map(|img| img.original_src.clone()));

    Some((
        Product {
            id: ProductId::new(product.id.as_str()),
            default_variant_id: Some(VariantId::new(node.id.as_str())),
            title: product.title.clone(),
            formatted_price: format_price(price),
            formatted_options: node.title.clone(),
            image,
            slug: product.handle.clone(),
            favorited: false,
        },
        price,
    ))
}

/// Price the cart lines that resolved to variants.
///
/// Lines are returned in the backend's node order. The subtotal is summed
/// exactly and rounded to cents.
///
/// # Errors
///
/// Returns an error if a variant price is not a decimal.
pub fn convert_cart_info(
    nodes: &[Option<VariantLookup>],
    items: &[CartItem],
) -> Result<Option<CartInfo>, PriceError> {
    let quantities: HashMap<&str, Quantity> = items
        .iter()
        .map(|item| (item.variant_id.as_str(), item.quantity))
        .collect();

    let mut subtotal = Decimal::ZERO;
    let mut currency_code = None;
    let mut lines = Vec::new();

    for node in nodes.iter().flatten() {
        let Some(&quantity) = quantities.get(node.id.as_str()) else {
            continue;
        };
        let Some((info, price)) = variant_info(node) else {
            continue;
        };

        let unit = Money::parse(&price.amount, price.currency_code.as_str())?;
        subtotal += unit.times(quantity.get()).amount;
        currency_code.get_or_insert_with(|| price.currency_code.clone());

        lines.push(FullCartItem {
            variant_id: VariantId::new(node.id.as_str()),
            quantity,
            info,
        });
    }

    let Some(currency_code) = currency_code else {
        return Ok(None);
    };

    let formatted_sub_total = Money::new(subtotal, currency_code).rounded().formatted();
    Ok(Some(CartInfo {
        formatted_taxes: CALCULATED_AT_CHECKOUT.to_owned(),
        formatted_total: formatted_sub_total.clone(),
        formatted_shipping: CALCULATED_AT_CHECKOUT.to_owned(),
        formatted_sub_total,
        items: lines,
    }))
}

/// Attach product details to wishlist lines that resolved to variants.
pub fn convert_wishlist_info(
    nodes: &[Option<VariantLookup>],
    items: &[WishlistItem],
) -> Option<Vec<FullWishlistItem>> {
    let by_variant: HashMap<&str, &WishlistItem> = items
        .iter()
        .map(|item| (item.variant_id.as_str(), item))
        .collect();

    let lines: Vec<FullWishlistItem> = nodes
        .iter()
        .flatten()
        .filter_map(|node| {
            let item = by_variant.get(node.id.as_str())?;
            let (info, _) = variant_info(node)?;
            Some(FullWishlistItem {
                product_id: info.id.clone(),
                variant_id: item.variant_id.clone(),
                quantity: item.quantity,
                info,
            })
        })
        .collect();

    (!lines.is_empty()).then_some(lines)
}
