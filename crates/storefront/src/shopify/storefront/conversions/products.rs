//! Product type conversion functions.

use crate::shopify::types::{ProductVariant, ProductVariants};

use super::super::queries::get_product_variants;
use super::cart::convert_money;

/// Convert a variants lookup result.
pub fn convert_product_variants(product: get_product_variants::ProductFields) -> ProductVariants {
    ProductVariants {
        product_id: product.id,
        title: product.title,
        variants: product
            .variants
            .edges
            .into_iter()
            .map(|e| ProductVariant {
                id: e.node.id,
                title: e.node.title,
                available_for_sale: e.node.available_for_sale,
                price: convert_money(e.node.price),
            })
            .collect(),
    }
}
