//! Remote operations the cart synchronizer depends on.

use std::future::Future;

use headless_cart_core::ProductId;
use secrecy::SecretString;

use crate::shopify::types::{Cart, CartLineInput, CartLineUpdateInput, ProductVariants};
use crate::shopify::{ShopifyError, StorefrontClient};

/// Cart and variant lookups against the commerce backend.
///
/// [`StorefrontClient`] is the production implementation; tests provide
/// in-memory fakes.
pub trait CartBackend: Send + Sync {
    /// Create a cart, optionally associated with a customer.
    fn create_cart(
        &self,
        lines: Vec<CartLineInput>,
        buyer_token: Option<&SecretString>,
    ) -> impl Future<Output = Result<Cart, ShopifyError>> + Send;

    /// Fetch a cart; `None` if it no longer exists.
    fn get_cart(
        &self,
        cart_id: &str,
    ) -> impl Future<Output = Result<Option<Cart>, ShopifyError>> + Send;

    /// Add lines to a cart.
    fn add_lines(
        &self,
        cart_id: &str,
        lines: Vec<CartLineInput>,
    ) -> impl Future<Output = Result<Cart, ShopifyError>> + Send;

    /// Change line quantities.
    fn update_lines(
        &self,
        cart_id: &str,
        lines: Vec<CartLineUpdateInput>,
    ) -> impl Future<Output = Result<Cart, ShopifyError>> + Send;

    /// Remove lines.
    fn remove_lines(
        &self,
        cart_id: &str,
        line_ids: Vec<String>,
    ) -> impl Future<Output = Result<Cart, ShopifyError>> + Send;

    /// List a product's variants; `None` if the product does not exist.
    fn product_variants(
        &self,
        product_id: &ProductId,
    ) -> impl Future<Output = Result<Option<ProductVariants>, ShopifyError>> + Send;
}

impl CartBackend for StorefrontClient {
    fn create_cart(
        &self,
        lines: Vec<CartLineInput>,
        buyer_token: Option<&SecretString>,
    ) -> impl Future<Output = Result<Cart, ShopifyError>> + Send {
        Self::create_cart(self, lines, buyer_token)
    }

    fn get_cart(
        &self,
        cart_id: &str,
    ) -> impl Future<Output = Result<Option<Cart>, ShopifyError>> + Send {
        Self::get_cart(self, cart_id)
    }

    fn add_lines(
        &self,
        cart_id: &str,
        lines: Vec<CartLineInput>,
    ) -> impl Future<Output = Result<Cart, ShopifyError>> + Send {
        Self::add_lines(self, cart_id, lines)
    }

    fn update_lines(
        &self,
        cart_id: &str,
        lines: Vec<CartLineUpdateInput>,
    ) -> impl Future<Output = Result<Cart, ShopifyError>> + Send {
        Self::update_lines(self, cart_id, lines)
    }

    fn remove_lines(
        &self,
        cart_id: &str,
        line_ids: Vec<String>,
    ) -> impl Future<Output = Result<Cart, ShopifyError>> + Send {
        Self::remove_lines(self, cart_id, line_ids)
    }

    fn product_variants(
        &self,
        product_id: &ProductId,
    ) -> impl Future<Output = Result<Option<ProductVariants>, ShopifyError>> + Send {
        self.get_product_variants(product_id)
    }
}
