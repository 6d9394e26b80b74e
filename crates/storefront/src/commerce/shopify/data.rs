//! Response shapes for the GraphQL documents in [`super::queries`].
//!
//! Only the fields the storefront reads are declared.

use serde::Deserialize;

use crate::commerce::GraphQLError;

/// GraphQL response envelope.
#[derive(Debug, Deserialize)]
pub struct GraphQLResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Option<Vec<GraphQLError>>,
}

#[derive(Debug, Deserialize)]
pub struct Edges<T> {
    pub edges: Vec<Edge<T>>,
}

impl<T> Edges<T> {
    pub fn first(&self) -> Option<&T> {
        self.edges.first().map(|edge| &edge.node)
    }

    pub fn into_nodes(self) -> impl Iterator<Item = T> {
        self.edges.into_iter().map(|edge| edge.node)
    }
}

#[derive(Debug, Deserialize)]
pub struct Edge<T> {
    #[serde(default)]
    pub cursor: Option<String>,
    pub node: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyV2 {
    pub amount: String,
    pub currency_code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageNode {
    pub original_src: String,
}

#[derive(Debug, Deserialize)]
pub struct IdNode {
    pub id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinPriceRange {
    pub min_variant_price: MoneyV2,
}

// =============================================================================
// Collections & Pages
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CollectionsData {
    pub collections: Edges<CollectionNode>,
}

#[derive(Debug, Deserialize)]
pub struct CollectionNode {
    pub title: String,
    pub handle: String,
}

#[derive(Debug, Deserialize)]
pub struct PagesData {
    pub pages: Edges<PageNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageNode {
    pub id: String,
    pub title: String,
    pub handle: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub body_summary: Option<String>,
}

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductConnection {
    pub page_info: PageInfo,
    pub edges: Vec<Edge<ProductCard>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCard {
    pub id: String,
    pub title: String,
    pub handle: String,
    pub price_range: MinPriceRange,
    pub images: Edges<ImageNode>,
    pub variants: Edges<IdNode>,
}

#[derive(Debug, Deserialize)]
pub struct ProductsData {
    pub products: ProductConnection,
}

#[derive(Debug, Deserialize)]
pub struct CollectionProductsData {
    pub collections: Edges<CollectionProducts>,
}

#[derive(Debug, Deserialize)]
pub struct CollectionProducts {
    pub products: ProductConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductData {
    pub product_by_handle: Option<ProductDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    pub id: String,
    pub handle: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub description_html: Option<String>,
    pub options: Vec<OptionNode>,
    pub price_range: MinPriceRange,
    pub variants: Edges<VariantNode>,
    pub images: Edges<ImageNode>,
}

#[derive(Debug, Deserialize)]
pub struct OptionNode {
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantNode {
    pub id: String,
    pub available_for_sale: bool,
    pub selected_options: Vec<SelectedOptionNode>,
    pub price_v2: MoneyV2,
}

#[derive(Debug, Deserialize)]
pub struct SelectedOptionNode {
    pub name: String,
    pub value: String,
}

// =============================================================================
// Variant lookups & checkout
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct NodesData {
    pub nodes: Vec<Option<VariantLookup>>,
}

/// A `nodes(ids:)` entry. Fields beyond `id` are only present for variants.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantLookup {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub image: Option<ImageNode>,
    #[serde(default)]
    pub price_v2: Option<MoneyV2>,
    #[serde(default)]
    pub product: Option<VariantProduct>,
}

#[derive(Debug, Deserialize)]
pub struct VariantProduct {
    pub id: String,
    pub title: String,
    pub handle: String,
    pub images: Edges<ImageNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCreateData {
    pub cart_create: Option<CartCreatePayload>,
}

#[derive(Debug, Deserialize)]
pub struct CartCreatePayload {
    pub cart: Option<CheckoutCart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutCart {
    pub checkout_url: String,
}
