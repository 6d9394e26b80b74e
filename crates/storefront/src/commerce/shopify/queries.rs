//! GraphQL documents for the Shopify Storefront API.

macro_rules! product_connection_fragment {
    () => {
        r"
fragment productConnection on ProductConnection {
  pageInfo {
    hasNextPage
    hasPreviousPage
  }
  edges {
    cursor
    node {
      id
      title
      vendor
      handle
      priceRange {
        minVariantPrice {
          amount
          currencyCode
        }
      }
      images(first: 1) {
        edges {
          node {
            originalSrc
            altText
            width
            height
          }
        }
      }
      variants(first: 1) {
        edges {
          node {
            id
          }
        }
      }
    }
  }
}
"
    };
}

pub const CREATE_CHECKOUT_URL: &str = r"
mutation calculateCart($lineItems: [CartLineInput!]) {
  cartCreate(input: { lines: $lineItems }) {
    cart {
      checkoutUrl
    }
  }
}
";

pub const GET_PRODUCT_VARIANTS: &str = r"
query getProductVariantsQuery($ids: [ID!]!) {
  nodes(ids: $ids) {
    id
    ... on ProductVariant {
      title
      image {
        originalSrc
      }
      priceV2 {
        amount
        currencyCode
      }
      product {
        id
        title
        handle
        images(first: 1) {
          edges {
            node {
              originalSrc
            }
          }
        }
      }
    }
  }
}
";

pub const GET_ALL_COLLECTIONS: &str = r"
query getSiteCollections($first: Int!) {
  collections(first: $first) {
    edges {
      node {
        title
        handle
      }
    }
  }
}
";

pub const GET_ALL_PAGES: &str = r"
query getAllPages($first: Int = 250) {
  pages(first: $first) {
    edges {
      node {
        id
        title
        handle
      }
    }
  }
}
";

pub const GET_PAGE: &str = r"
query getPage($query: String) {
  pages(first: 1, query: $query) {
    edges {
      node {
        id
        handle
        title
        body
        bodySummary
      }
    }
  }
}
";

pub const GET_ALL_PRODUCTS: &str = concat!(
    r#"
query getAllProducts(
  $first: Int = 20
  $query: String = ""
  $sortKey: ProductSortKeys = RELEVANCE
  $reverse: Boolean = false
  $cursor: String
) {
  products(first: $first, sortKey: $sortKey, reverse: $reverse, query: $query, after: $cursor) {
    ...productConnection
  }
}
"#,
    product_connection_fragment!()
);

pub const GET_COLLECTION_PRODUCTS: &str = concat!(
    r"
query getProductsFromCollection(
  $collection: String
  $first: Int = 20
  $sortKey: ProductCollectionSortKeys = RELEVANCE
  $reverse: Boolean = false
  $cursor: String
) {
  collections(first: 1, query: $collection) {
    edges {
      node {
        handle
        products(first: $first, sortKey: $sortKey, reverse: $reverse, after: $cursor) {
          ...productConnection
        }
      }
    }
  }
}
",
    product_connection_fragment!()
);

pub const GET_PRODUCT: &str = r"
query getProductBySlug($slug: String!) {
  productByHandle(handle: $slug) {
    id
    handle
    availableForSale
    title
    description
    descriptionHtml
    options {
      id
      name
      values
    }
    priceRange {
      minVariantPrice {
        amount
        currencyCode
      }
    }
    variants(first: 250) {
      edges {
        node {
          id
          title
          availableForSale
          selectedOptions {
            name
            value
          }
          priceV2 {
            amount
            currencyCode
          }
        }
      }
    }
    images(first: 20) {
      edges {
        node {
          originalSrc
          altText
        }
      }
    }
  }
}
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_queries_include_fragment() {
        for query in [GET_ALL_PRODUCTS, GET_COLLECTION_PRODUCTS] {
            assert!(query.contains("...productConnection"));
            assert!(query.contains("fragment productConnection on ProductConnection"));
        }
    }
}
