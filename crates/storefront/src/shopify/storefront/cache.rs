//! Cache types for Storefront API responses.

use crate::shopify::types::ProductVariants;

/// Cached value types.
///
/// Only product data is cached; carts and customers are mutable state.
#[derive(Debug, Clone)]
pub enum CacheValue {
    ProductVariants(Box<ProductVariants>),
}

/// Cache key for a product's variants.
pub fn product_variants_key(product_id: &str) -> String {
    format!("variants:{product_id}")
}
