//! Cart synchronizer.
//!
//! Keeps a local reference to the Shopify cart and a snapshot of its
//! contents, and repairs the reference when Shopify stops recognizing it.
//!
//! # State
//!
//! The only state machine is the cart reference, present or absent:
//!
//! - **absent → present**: the first add creates a cart (with buyer identity
//!   when a customer is signed in) and caches its reference.
//! - **present → present**: add/update/remove mutate the cached cart and
//!   replace the snapshot from Shopify's response.
//! - **present → absent**: a stale reference is dropped. An add is re-issued
//!   once against a fresh cart; update and remove reset the snapshot instead.
//!
//! All mutations run one at a time behind an async lock, including the
//! recovery path, so a burst of adds cannot create several replacement carts.
//! Readers ([`CartSynchronizer::snapshot`], [`CartSynchronizer::is_loading`],
//! [`CartSynchronizer::last_error`]) never wait on a remote call.

use std::sync::{Arc, Mutex, PoisonError};

use headless_cart_core::{
    IdentifierInput, MerchandiseRef, ProductId, VariantId, classify_merchandise,
};
use secrecy::SecretString;
use tracing::{debug, info, instrument, warn};

use crate::shopify::ShopifyError;
use crate::shopify::types::{Cart, CartLineInput, CartLineUpdateInput};
use crate::store::{CART_KEY, KeyValueStore, StoreError, load_json, save_json};

use super::{
    CartBackend, CartError, CartReference, CartSnapshot, ErrorClass, ErrorClassifier,
    MessageClassifier, RetryPolicy,
};

/// What to put in the cart.
///
/// `variant_id` is an explicit variant selection; without one, `id` may be a
/// variant or a product, and a product is resolved to its first available
/// variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddToCart {
    /// Product or variant identifier of the listing.
    pub id: IdentifierInput,
    /// Explicitly selected variant.
    pub variant_id: Option<IdentifierInput>,
}

impl AddToCart {
    /// Add by product or variant identifier.
    pub fn new(id: impl Into<IdentifierInput>) -> Self {
        Self {
            id: id.into(),
            variant_id: None,
        }
    }

    /// Select a specific variant.
    #[must_use]
    pub fn with_variant(mut self, variant_id: impl Into<IdentifierInput>) -> Self {
        self.variant_id = Some(variant_id.into());
        self
    }

    fn identifier(&self) -> &IdentifierInput {
        self.variant_id.as_ref().unwrap_or(&self.id)
    }
}

impl From<&str> for AddToCart {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for AddToCart {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl From<u64> for AddToCart {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

/// A line to start a cart with, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateLine {
    /// Merchandise identifier; must be a variant global ID to be kept.
    pub merchandise_id: String,
    /// Quantity; zero is dropped.
    pub quantity: u32,
}

impl CandidateLine {
    /// A candidate line.
    pub fn new(merchandise_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            merchandise_id: merchandise_id.into(),
            quantity,
        }
    }
}

#[derive(Default)]
struct State {
    reference: Option<CartReference>,
    snapshot: CartSnapshot,
    loading: bool,
    last_error: Option<String>,
    buyer_token: Option<SecretString>,
}

/// Keeps the local cart in step with Shopify.
///
/// Construct once at start-up and share it (e.g., in an `Arc`).
pub struct CartSynchronizer<B, S> {
    backend: Arc<B>,
    store: Arc<S>,
    classifier: Box<dyn ErrorClassifier>,
    retry: RetryPolicy,
    flight: tokio::sync::Mutex<()>,
    state: Mutex<State>,
}

/// Clears the loading flag when a mutation finishes, however it finishes.
struct LoadingGuard<'a> {
    state: &'a Mutex<State>,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .loading = false;
    }
}

impl<B, S> CartSynchronizer<B, S>
where
    B: CartBackend,
    S: KeyValueStore,
{
    /// Create a synchronizer with the default classifier and a single retry.
    pub fn new(backend: Arc<B>, store: Arc<S>) -> Self {
        Self {
            backend,
            store,
            classifier: Box::new(MessageClassifier::default()),
            retry: RetryPolicy::once(),
            flight: tokio::sync::Mutex::new(()),
            state: Mutex::new(State::default()),
        }
    }

    /// Replace the failure classifier.
    #[must_use]
    pub fn with_classifier(mut self, classifier: impl ErrorClassifier + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    /// Replace the stale-reference retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    // =========================================================================
    // Readers
    // =========================================================================

    /// Current cart contents.
    pub fn snapshot(&self) -> CartSnapshot {
        self.with_state(|s| s.snapshot.clone())
    }

    /// Whether a mutation is in flight.
    pub fn is_loading(&self) -> bool {
        self.with_state(|s| s.loading)
    }

    /// Message of the last failed operation.
    pub fn last_error(&self) -> Option<String> {
        self.with_state(|s| s.last_error.clone())
    }

    /// Where to send the buyer to pay, if a cart exists.
    pub fn checkout_url(&self) -> Option<String> {
        self.with_state(|s| s.snapshot.checkout_url.clone())
    }

    /// The cached cart reference.
    pub fn reference(&self) -> Option<CartReference> {
        self.with_state(|s| s.reference.clone())
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Load the cached cart reference and fetch its cart.
    ///
    /// A reference Shopify no longer knows, or one that cannot be fetched, is
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns an error only if the local store fails.
    #[instrument(skip(self))]
    pub async fn restore(&self) -> Result<CartSnapshot, CartError> {
        let _flight = self.flight.lock().await;
        let _loading = self.begin();

        let reference: Option<CartReference> = match load_json(&*self.store, CART_KEY).await {
            Ok(r) => r,
            Err(StoreError::Serde(e)) => {
                warn!(error = %e, "Discarding unreadable cart reference");
                self.store.remove(CART_KEY).await?;
                None
            }
            Err(e) => return Err(self.fail(e.into())),
        };

        let Some(reference) = reference else {
            return Ok(self.snapshot());
        };
        self.with_state(|s| s.reference = Some(reference.clone()));

        match self.backend.get_cart(&reference.cart_id).await {
            Ok(Some(cart)) => self.apply_cart(&cart).await.map_err(|e| self.fail(e)),
            Ok(None) => {
                info!(cart_id = %reference.cart_id, "Cached cart no longer exists");
                self.forget_cart().await.map_err(|e| self.fail(e))?;
                Ok(self.snapshot())
            }
            Err(e) => {
                warn!(cart_id = %reference.cart_id, error = %e, "Failed to fetch cached cart");
                self.forget_cart().await.map_err(|e| self.fail(e))?;
                Ok(self.snapshot())
            }
        }
    }

    /// Re-fetch the cart for the cached reference.
    ///
    /// # Errors
    ///
    /// Returns `CartError::StaleReference` (after resetting the snapshot) if
    /// the cart is gone, or the classified remote failure.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<CartSnapshot, CartError> {
        let _flight = self.flight.lock().await;
        let _loading = self.begin();

        let Some(reference) = self.reference() else {
            return Ok(self.snapshot());
        };

        let result = match self.backend.get_cart(&reference.cart_id).await {
            Ok(Some(cart)) => self.apply_cart(&cart).await,
            Ok(None) => Err(CartError::StaleReference(format!(
                "Cart not found: {}",
                reference.cart_id
            ))),
            Err(e) => Err(self.classify(e)),
        };
        self.reset_if_stale(result).await
    }

    /// Add merchandise to the cart, creating the cart if needed.
    ///
    /// Product IDs are resolved to their first available variant. If the
    /// cached cart turns out to be stale, a new cart is created with the same
    /// line.
    ///
    /// # Errors
    ///
    /// Input errors (`InvalidQuantity`, `UnresolvableIdentifier`) are
    /// returned before any remote call. Remote failures are classified.
    #[instrument(skip(self, item), fields(item = %item.identifier()))]
    pub async fn add_to_cart(
        &self,
        item: AddToCart,
        quantity: i64,
    ) -> Result<CartSnapshot, CartError> {
        if quantity < 1 {
            return Err(self.fail(CartError::InvalidQuantity(quantity)));
        }
        let merchandise = classify_merchandise(item.identifier().clone())
            .map_err(|e| self.fail(e.into()))?;

        let _flight = self.flight.lock().await;
        let _loading = self.begin();

        let result = self.add_locked(merchandise, quantity).await;
        result.map_err(|e| self.fail(e))
    }

    /// Change a line's quantity.
    ///
    /// Does nothing without a cart. A stale cart resets the snapshot to empty.
    ///
    /// # Errors
    ///
    /// `InvalidQuantity` for quantities below one, before any remote call.
    #[instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        line_id: &str,
        quantity: i64,
    ) -> Result<CartSnapshot, CartError> {
        if quantity < 1 {
            return Err(self.fail(CartError::InvalidQuantity(quantity)));
        }

        let _flight = self.flight.lock().await;
        let _loading = self.begin();

        let Some(reference) = self.reference() else {
            debug!("No cart to update");
            return Ok(self.snapshot());
        };

        let lines = vec![CartLineUpdateInput {
            id: line_id.to_string(),
            quantity,
        }];
        let result = match self.backend.update_lines(&reference.cart_id, lines).await {
            Ok(cart) => self.apply_cart(&cart).await,
            Err(e) => Err(self.classify(e)),
        };
        self.reset_if_stale(result).await
    }

    /// Remove a line.
    ///
    /// Does nothing without a cart. A stale cart resets the snapshot to empty.
    ///
    /// # Errors
    ///
    /// Returns the classified remote failure.
    #[instrument(skip(self))]
    pub async fn remove_line(&self, line_id: &str) -> Result<CartSnapshot, CartError> {
        let _flight = self.flight.lock().await;
        let _loading = self.begin();

        let Some(reference) = self.reference() else {
            debug!("No cart to remove from");
            return Ok(self.snapshot());
        };

        let result = match self
            .backend
            .remove_lines(&reference.cart_id, vec![line_id.to_string()])
            .await
        {
            Ok(cart) => self.apply_cart(&cart).await,
            Err(e) => Err(self.classify(e)),
        };
        self.reset_if_stale(result).await
    }

    /// Forget the cart locally. The next add starts a new one.
    ///
    /// # Errors
    ///
    /// Returns an error if the local store fails.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<(), CartError> {
        let _flight = self.flight.lock().await;
        let _loading = self.begin();

        self.forget_cart().await.map_err(|e| self.fail(e))?;
        self.with_state(|s| s.snapshot = CartSnapshot::empty());
        Ok(())
    }

    /// Start a new cart from candidate lines, replacing any cached one.
    ///
    /// Candidates that do not name a variant, or have quantity zero, are
    /// skipped.
    ///
    /// # Errors
    ///
    /// `NoValidLineItems` if no candidate survives validation, before any
    /// remote call.
    #[instrument(skip(self, candidates), fields(candidates = candidates.len()))]
    pub async fn create_cart(
        &self,
        candidates: Vec<CandidateLine>,
    ) -> Result<CartSnapshot, CartError> {
        let lines = validate_lines(candidates).map_err(|e| self.fail(e))?;

        let _flight = self.flight.lock().await;
        let _loading = self.begin();

        self.create_locked(lines).await.map_err(|e| self.fail(e))
    }

    /// A customer signed in.
    ///
    /// Later carts carry the customer's identity. If the cart has items it
    /// is re-created with them so Shopify links it to the customer.
    ///
    /// # Errors
    ///
    /// Returns the failure of re-creating the cart. The old reference is
    /// dropped either way.
    #[instrument(skip(self, token))]
    pub async fn on_authenticated(&self, token: SecretString) -> Result<CartSnapshot, CartError> {
        let _flight = self.flight.lock().await;
        self.with_state(|s| s.buyer_token = Some(token));

        let snapshot = self.snapshot();
        if snapshot.is_empty() {
            return Ok(snapshot);
        }

        let _loading = self.begin();
        info!(lines = snapshot.items.len(), "Moving cart to signed-in customer");

        let candidates = snapshot
            .items
            .iter()
            .map(|item| CandidateLine::new(item.merchandise_id.as_str(), item.quantity))
            .collect();

        let result = async {
            let lines = validate_lines(candidates)?;
            self.forget_cart().await?;
            self.create_locked(lines).await
        }
        .await;
        result.map_err(|e| self.fail(e))
    }

    /// Resume a customer session restored from an earlier run.
    ///
    /// Carts created from now on carry the customer's identity; the current
    /// cart is left alone.
    pub fn resume_identity(&self, token: SecretString) {
        self.with_state(|s| s.buyer_token = Some(token));
    }

    /// The customer signed out; later carts are anonymous.
    pub fn on_signed_out(&self) {
        self.with_state(|s| s.buyer_token = None);
    }

    // =========================================================================
    // Internals (called with the flight lock held)
    // =========================================================================

    async fn add_locked(
        &self,
        merchandise: MerchandiseRef,
        quantity: i64,
    ) -> Result<CartSnapshot, CartError> {
        let merchandise_id = match merchandise {
            MerchandiseRef::Variant(id) => id,
            MerchandiseRef::Product(product_id) => self.resolve_variant(&product_id).await?,
        };
        debug!(merchandise_id = %merchandise_id, quantity, "Adding to cart");

        let lines = vec![CartLineInput {
            merchandise_id,
            quantity,
        }];

        let Some(reference) = self.reference() else {
            return self.create_locked(lines).await;
        };

        match self.backend.add_lines(&reference.cart_id, lines.clone()).await {
            Ok(cart) => self.apply_cart(&cart).await,
            Err(e) => {
                let err = self.classify(e);
                if !matches!(err, CartError::StaleReference(_)) {
                    return Err(err);
                }

                warn!(cart_id = %reference.cart_id, error = %err, "Cart reference is stale, creating a new cart");
                self.forget_cart().await?;

                let mut retry = self.retry;
                if !retry.next_attempt().await {
                    return Err(err);
                }
                self.create_locked(lines).await
            }
        }
    }

    async fn create_locked(&self, lines: Vec<CartLineInput>) -> Result<CartSnapshot, CartError> {
        let buyer_token = self.with_state(|s| s.buyer_token.clone());
        let cart = self
            .backend
            .create_cart(lines, buyer_token.as_ref())
            .await
            .map_err(|e| self.classify(e))?;
        info!(cart_id = %cart.id, "Cart created");
        self.apply_cart(&cart).await
    }

    /// Pick the variant to use for a product.
    async fn resolve_variant(&self, product_id: &ProductId) -> Result<VariantId, CartError> {
        let product = self
            .backend
            .product_variants(product_id)
            .await
            .map_err(|e| match self.classify(e) {
                CartError::StaleReference(message) => CartError::VariantLookup(message),
                other => other,
            })?
            .ok_or_else(|| CartError::VariantLookup("Product not found".to_string()))?;

        let variant = product
            .variants
            .iter()
            .find(|v| v.available_for_sale)
            .or_else(|| product.variants.first())
            .ok_or_else(|| {
                CartError::VariantLookup("No variants available for this product".to_string())
            })?;

        debug!(variant_id = %variant.id, title = %variant.title, "Resolved product to variant");
        VariantId::parse(&variant.id).map_err(|e| CartError::MalformedResponse(e.to_string()))
    }

    /// Replace the snapshot and cached reference with Shopify's cart.
    async fn apply_cart(&self, cart: &Cart) -> Result<CartSnapshot, CartError> {
        let snapshot = CartSnapshot::try_from(cart)?;
        let reference = CartReference::from(cart);

        let changed = self.with_state(|s| {
            s.snapshot = snapshot.clone();
            let changed = s.reference.as_ref() != Some(&reference);
            s.reference = Some(reference.clone());
            changed
        });
        if changed {
            save_json(&*self.store, CART_KEY, &reference).await?;
        }
        Ok(snapshot)
    }

    /// Drop the cart reference locally and in the store.
    async fn forget_cart(&self) -> Result<(), CartError> {
        self.with_state(|s| s.reference = None);
        self.store.remove(CART_KEY).await?;
        Ok(())
    }

    /// On a stale reference, drop it and empty the snapshot.
    async fn reset_if_stale(
        &self,
        result: Result<CartSnapshot, CartError>,
    ) -> Result<CartSnapshot, CartError> {
        match result {
            Err(err @ CartError::StaleReference(_)) => {
                warn!(error = %err, "Cart reference is stale, resetting cart");
                self.with_state(|s| s.snapshot = CartSnapshot::empty());
                if let Err(e) = self.forget_cart().await {
                    return Err(self.fail(e));
                }
                Err(self.fail(err))
            }
            Err(err) => Err(self.fail(err)),
            Ok(snapshot) => Ok(snapshot),
        }
    }

    fn classify(&self, error: ShopifyError) -> CartError {
        match self.classifier.classify(&error) {
            ErrorClass::StaleReference => CartError::StaleReference(error.first_message()),
            ErrorClass::Network => CartError::Network(error),
            ErrorClass::RemoteUserError => CartError::RemoteUserError(error.first_message()),
            ErrorClass::Malformed => CartError::MalformedResponse(error.to_string()),
        }
    }

    /// Record a failure in the shared error state.
    fn fail(&self, error: CartError) -> CartError {
        if error.is_input_error() {
            warn!(error = %error, "Cart operation rejected");
        } else {
            tracing::error!(error = %error, "Cart operation failed");
        }
        self.with_state(|s| s.last_error = Some(error.to_string()));
        error
    }

    /// Mark a mutation as started.
    fn begin(&self) -> LoadingGuard<'_> {
        self.with_state(|s| {
            s.loading = true;
            s.last_error = None;
        });
        LoadingGuard { state: &self.state }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        f(&mut self.state.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

/// Keep candidates that name a variant with a positive quantity.
fn validate_lines(candidates: Vec<CandidateLine>) -> Result<Vec<CartLineInput>, CartError> {
    let lines: Vec<_> = candidates
        .into_iter()
        .filter_map(|c| {
            if c.quantity == 0 {
                warn!(merchandise_id = %c.merchandise_id, "Skipping line item with zero quantity");
                return None;
            }
            match VariantId::parse(&c.merchandise_id) {
                Ok(merchandise_id) => Some(CartLineInput {
                    merchandise_id,
                    quantity: i64::from(c.quantity),
                }),
                Err(e) => {
                    warn!(merchandise_id = %c.merchandise_id, error = %e, "Skipping invalid line item");
                    None
                }
            }
        })
        .collect();

    if lines.is_empty() {
        return Err(CartError::NoValidLineItems);
    }
    Ok(lines)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_lines_drops_products_and_zero_quantities() {
        let lines = validate_lines(vec![
            CandidateLine::new("gid://shopify/Product/1", 1),
            CandidateLine::new("gid://shopify/ProductVariant/2", 0),
            CandidateLine::new("not-an-id", 1),
            CandidateLine::new("gid://shopify/ProductVariant/3", 4),
        ])
        .unwrap();

        assert_eq!(
            lines,
            vec![CartLineInput {
                merchandise_id: VariantId::from_numeric(3),
                quantity: 4,
            }]
        );
    }

    #[test]
    fn test_validate_lines_all_invalid() {
        let err = validate_lines(vec![CandidateLine::new("gid://shopify/Product/1", 2)])
            .unwrap_err();
        assert!(matches!(err, CartError::NoValidLineItems));
        assert!(matches!(validate_lines(vec![]), Err(CartError::NoValidLineItems)));
    }

    #[test]
    fn test_add_to_cart_prefers_explicit_variant() {
        let item = AddToCart::new("gid://shopify/Product/1").with_variant(7_u64);
        assert_eq!(item.identifier(), &IdentifierInput::Numeric(7));
        let item = AddToCart::from("gid://shopify/Product/1");
        assert_eq!(
            item.identifier(),
            &IdentifierInput::Text("gid://shopify/Product/1".to_string())
        );
    }
}
