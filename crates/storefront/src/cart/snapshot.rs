//! Local view of the remote cart.

use headless_cart_core::{CurrencyCode, Price, VariantId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::shopify::types::{Cart, CartLine};

use super::CartError;

/// Title Shopify gives the only variant of a product without options.
const DEFAULT_VARIANT_TITLE: &str = "Default Title";

/// Persisted pointer to the remote cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartReference {
    /// Shopify cart ID (opaque, includes the cart key).
    pub cart_id: String,
    /// Checkout URL last reported for this cart.
    pub checkout_url: Option<String>,
}

impl From<&Cart> for CartReference {
    fn from(cart: &Cart) -> Self {
        Self {
            cart_id: cart.id.clone(),
            checkout_url: Some(cart.checkout_url.clone()),
        }
    }
}

/// One line of the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItem {
    /// Cart line ID, used for update and remove.
    pub line_id: String,
    /// Variant in the line.
    pub merchandise_id: VariantId,
    /// Quantity (at least 1).
    pub quantity: u32,
    /// Product title.
    pub title: String,
    /// Variant title, `None` for single-variant products.
    pub variant_title: Option<String>,
    /// Price of one unit.
    pub unit_price: Price,
    /// Variant image, falling back to the product's featured image.
    pub image_url: Option<String>,
    /// Product handle.
    pub product_handle: String,
}

impl LineItem {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        Price::new(
            self.unit_price.amount * Decimal::from(self.quantity),
            self.unit_price.currency_code,
        )
    }
}

impl TryFrom<&CartLine> for LineItem {
    type Error = CartError;

    fn try_from(line: &CartLine) -> Result<Self, Self::Error> {
        let m = &line.merchandise;
        let merchandise_id = VariantId::parse(&m.id)
            .map_err(|e| CartError::MalformedResponse(format!("line {}: {e}", line.id)))?;
        let quantity = u32::try_from(line.quantity).map_err(|_| {
            CartError::MalformedResponse(format!("line {}: quantity {}", line.id, line.quantity))
        })?;
        let unit_price = Price::parse(&m.price.amount, &m.price.currency_code)
            .map_err(|e| CartError::MalformedResponse(format!("line {}: {e}", line.id)))?;

        Ok(Self {
            line_id: line.id.clone(),
            merchandise_id,
            quantity,
            title: m.product.title.clone(),
            variant_title: (m.title != DEFAULT_VARIANT_TITLE).then(|| m.title.clone()),
            unit_price,
            image_url: m
                .image
                .as_ref()
                .or(m.product.featured_image.as_ref())
                .map(|img| img.url.clone()),
            product_handle: m.product.handle.clone(),
        })
    }
}

/// Cart contents as last reported by Shopify.
///
/// Never edited in place: every successful remote call replaces it whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartSnapshot {
    /// Lines in Shopify's order.
    pub items: Vec<LineItem>,
    /// Sum of line quantities.
    pub total_quantity: u32,
    /// Subtotal before taxes and shipping.
    pub subtotal: Price,
    /// Where to send the buyer to pay.
    pub checkout_url: Option<String>,
}

impl CartSnapshot {
    /// The empty cart.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            items: Vec::new(),
            total_quantity: 0,
            subtotal: Price::zero(CurrencyCode::USD),
            checkout_url: None,
        }
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Find a line by ID.
    #[must_use]
    pub fn item(&self, line_id: &str) -> Option<&LineItem> {
        self.items.iter().find(|i| i.line_id == line_id)
    }
}

impl Default for CartSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

impl TryFrom<&Cart> for CartSnapshot {
    type Error = CartError;

    fn try_from(cart: &Cart) -> Result<Self, Self::Error> {
        let items = cart
            .lines
            .iter()
            .map(LineItem::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let total_quantity = u32::try_from(cart.total_quantity).map_err(|_| {
            CartError::MalformedResponse(format!("total quantity {}", cart.total_quantity))
        })?;
        let subtotal = Price::parse(&cart.cost.subtotal.amount, &cart.cost.subtotal.currency_code)
            .map_err(|e| CartError::MalformedResponse(format!("subtotal: {e}")))?;

        Ok(Self {
            items,
            total_quantity,
            subtotal,
            checkout_url: Some(cart.checkout_url.clone()),
        })
    }
}
