//! Type conversion functions for Shopify Storefront API responses.

pub mod cart;
pub mod customer;
pub mod products;

pub use cart::{convert_cart, convert_user_errors};
pub use customer::{convert_customer, convert_order_connection};
pub use products::convert_product_variants;
