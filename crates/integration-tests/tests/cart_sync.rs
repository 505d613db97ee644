//! Cart synchronizer against an in-memory Storefront API.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use headless_cart::cart::{
    AddToCart, CandidateLine, CartError, CartReference, CartSynchronizer, RetryPolicy,
};
use headless_cart::store::{CART_KEY, FileStore, KeyValueStore, MemoryStore, load_json};
use headless_cart_integration_tests::{Call, FakeShopify, Failure};
use secrecy::SecretString;

const TEE: &str = "gid://shopify/Product/1";
const TEE_SMALL: &str = "gid://shopify/ProductVariant/11";
const TEE_MEDIUM: &str = "gid://shopify/ProductVariant/12";
const STICKER: &str = "gid://shopify/ProductVariant/21";

fn catalog() -> FakeShopify {
    FakeShopify::new()
        .with_product(
            1,
            "Pineapple Tee",
            &[(11, "Small", false, "25.00"), (12, "Medium", true, "25.00")],
        )
        .with_product(2, "Sticker", &[(21, "Default Title", true, "3.50")])
        .with_product(3, "Sold Out Hat", &[(31, "One Size", false, "18.00")])
}

struct Harness {
    fake: Arc<FakeShopify>,
    store: Arc<MemoryStore>,
    cart: CartSynchronizer<FakeShopify, MemoryStore>,
}

fn harness() -> Harness {
    let fake = Arc::new(catalog());
    let store = Arc::new(MemoryStore::new());
    let cart = CartSynchronizer::new(Arc::clone(&fake), Arc::clone(&store));
    Harness { fake, store, cart }
}

impl Harness {
    fn cart_id(&self) -> String {
        self.cart.reference().unwrap().cart_id
    }
}

// ============================================================================
// Creating carts
// ============================================================================

#[tokio::test]
async fn test_first_add_creates_one_cart_and_caches_reference() {
    let h = harness();

    let snapshot = h.cart.add_to_cart(AddToCart::from(STICKER), 1).await.unwrap();

    assert_eq!(h.fake.carts_created(), 1);
    assert_eq!(snapshot.items.len(), 1);
    assert_eq!(snapshot.items[0].title, "Sticker");
    assert_eq!(snapshot.items[0].variant_title, None);

    let reference = h.cart.reference().unwrap();
    let stored: Option<CartReference> = load_json(&*h.store, CART_KEY).await.unwrap();
    assert_eq!(stored, Some(reference.clone()));
    assert_eq!(h.cart.checkout_url(), reference.checkout_url);
}

#[tokio::test]
async fn test_second_add_mutates_existing_cart() {
    let h = harness();
    h.cart.add_to_cart(AddToCart::from(STICKER), 1).await.unwrap();
    let cart_id = h.cart_id();

    let snapshot = h.cart.add_to_cart(AddToCart::from(TEE_MEDIUM), 1).await.unwrap();

    assert_eq!(h.fake.carts_created(), 1);
    assert_eq!(snapshot.items.len(), 2);
    assert_eq!(snapshot.total_quantity, 2);
    assert_eq!(
        h.fake.cart_mutations().last(),
        Some(&Call::AddLines {
            cart_id,
            lines: vec![(TEE_MEDIUM.to_string(), 1)],
        })
    );
}

#[tokio::test]
async fn test_numeric_ids_are_sent_as_variant_ids() {
    let h = harness();

    h.cart.add_to_cart(AddToCart::from(21_u64), 1).await.unwrap();
    h.cart.add_to_cart(AddToCart::from("12"), 1).await.unwrap();

    for call in h.fake.cart_mutations() {
        let lines = match call {
            Call::CreateCart { lines, .. } | Call::AddLines { lines, .. } => lines,
            other => panic!("unexpected call: {other:?}"),
        };
        for (merchandise_id, _) in lines {
            assert!(merchandise_id.starts_with("gid://shopify/ProductVariant/"));
        }
    }
}

// ============================================================================
// Product resolution
// ============================================================================

#[tokio::test]
async fn test_product_add_resolves_first_available_variant() {
    let h = harness();

    let snapshot = h.cart.add_to_cart(AddToCart::from(TEE), 2).await.unwrap();

    assert_eq!(
        h.fake.calls(),
        vec![
            Call::ProductVariants(TEE.to_string()),
            Call::CreateCart {
                lines: vec![(TEE_MEDIUM.to_string(), 2)],
                buyer: None,
            },
        ]
    );
    assert_eq!(snapshot.items.len(), 1);
    assert_eq!(snapshot.total_quantity, 2);
    assert_eq!(snapshot.items[0].merchandise_id.as_str(), TEE_MEDIUM);
    assert_eq!(snapshot.items[0].variant_title.as_deref(), Some("Medium"));
    assert_eq!(snapshot.subtotal.to_string(), "$50.00");
}

#[tokio::test]
async fn test_product_without_available_variants_uses_first() {
    let h = harness();

    let snapshot = h
        .cart
        .add_to_cart(AddToCart::from("gid://shopify/Product/3"), 1)
        .await
        .unwrap();

    assert_eq!(
        snapshot.items[0].merchandise_id.as_str(),
        "gid://shopify/ProductVariant/31"
    );
}

#[tokio::test]
async fn test_explicit_variant_skips_lookup() {
    let h = harness();

    h.cart
        .add_to_cart(AddToCart::new(TEE).with_variant(TEE_SMALL), 1)
        .await
        .unwrap();

    assert!(
        !h.fake
            .calls()
            .iter()
            .any(|c| matches!(c, Call::ProductVariants(_)))
    );
    assert_eq!(
        h.fake.cart_mutations(),
        vec![Call::CreateCart {
            lines: vec![(TEE_SMALL.to_string(), 1)],
            buyer: None,
        }]
    );
}

#[tokio::test]
async fn test_unknown_product_is_a_variant_lookup_error() {
    let h = harness();

    let err = h
        .cart
        .add_to_cart(AddToCart::from("gid://shopify/Product/404"), 1)
        .await
        .unwrap_err();

    assert!(matches!(err, CartError::VariantLookup(_)));
    assert_eq!(h.fake.carts_created(), 0);
    assert!(h.cart.reference().is_none());
    assert_eq!(h.cart.last_error(), Some(err.to_string()));
}

// ============================================================================
// Input validation
// ============================================================================

#[tokio::test]
async fn test_bad_quantity_is_rejected_before_any_call() {
    let h = harness();
    h.cart.add_to_cart(AddToCart::from(STICKER), 1).await.unwrap();
    let line_id = h.cart.snapshot().items[0].line_id.clone();
    let calls = h.fake.calls().len();

    let err = h.cart.update_quantity(&line_id, 0).await.unwrap_err();
    assert!(matches!(err, CartError::InvalidQuantity(0)));

    let err = h.cart.add_to_cart(AddToCart::from(STICKER), -1).await.unwrap_err();
    assert!(matches!(err, CartError::InvalidQuantity(-1)));

    assert_eq!(h.fake.calls().len(), calls);
    assert_eq!(h.cart.snapshot().items[0].quantity, 1);
}

#[tokio::test]
async fn test_unresolvable_identifiers_are_rejected_before_any_call() {
    let h = harness();

    for id in ["", "no-digits-here", "gid://shopify/Collection/5"] {
        let err = h.cart.add_to_cart(AddToCart::from(id), 1).await.unwrap_err();
        assert!(
            matches!(err, CartError::UnresolvableIdentifier(_)),
            "{id:?}: {err:?}"
        );
    }
    assert!(h.fake.calls().is_empty());
    assert!(!h.cart.is_loading());
}

#[tokio::test]
async fn test_create_cart_skips_invalid_candidates() {
    let h = harness();

    let snapshot = h
        .cart
        .create_cart(vec![
            CandidateLine::new(TEE, 1),
            CandidateLine::new(STICKER, 0),
            CandidateLine::new(TEE_MEDIUM, 2),
        ])
        .await
        .unwrap();

    assert_eq!(
        h.fake.cart_mutations(),
        vec![Call::CreateCart {
            lines: vec![(TEE_MEDIUM.to_string(), 2)],
            buyer: None,
        }]
    );
    assert_eq!(snapshot.total_quantity, 2);
}

#[tokio::test]
async fn test_create_cart_with_no_valid_lines() {
    let h = harness();

    let err = h
        .cart
        .create_cart(vec![CandidateLine::new(TEE, 1)])
        .await
        .unwrap_err();

    assert!(matches!(err, CartError::NoValidLineItems));
    assert!(h.fake.calls().is_empty());
}

// ============================================================================
// Update and remove
// ============================================================================

#[tokio::test]
async fn test_update_quantity_takes_subtotal_from_server() {
    let h = harness();
    h.cart.add_to_cart(AddToCart::from(STICKER), 1).await.unwrap();
    let cart_id = h.cart_id();
    let line_id = h.cart.snapshot().items[0].line_id.clone();

    let snapshot = h.cart.update_quantity(&line_id, 3).await.unwrap();

    assert_eq!(
        h.fake.cart_mutations().last(),
        Some(&Call::UpdateLines {
            cart_id: cart_id.clone(),
            lines: vec![(line_id.clone(), 3)],
        })
    );
    assert_eq!(snapshot.item(&line_id).unwrap().quantity, 3);
    assert_eq!(snapshot.total_quantity, 3);
    assert_eq!(snapshot.subtotal.to_string(), "$10.50");
    assert_eq!(
        snapshot.subtotal.to_string(),
        format!("${}", h.fake.cart(&cart_id).unwrap().cost.subtotal.amount)
    );
}

#[tokio::test]
async fn test_remove_line() {
    let h = harness();
    h.cart.add_to_cart(AddToCart::from(STICKER), 1).await.unwrap();
    h.cart.add_to_cart(AddToCart::from(TEE_MEDIUM), 1).await.unwrap();
    let line_id = h.cart.snapshot().items[0].line_id.clone();

    let snapshot = h.cart.remove_line(&line_id).await.unwrap();

    assert_eq!(snapshot.items.len(), 1);
    assert!(snapshot.item(&line_id).is_none());
    assert!(h.cart.reference().is_some());
}

#[tokio::test]
async fn test_update_and_remove_without_cart_do_nothing() {
    let h = harness();

    let snapshot = h.cart.update_quantity("gid://shopify/CartLine/1", 2).await.unwrap();
    assert!(snapshot.is_empty());
    let snapshot = h.cart.remove_line("gid://shopify/CartLine/1").await.unwrap();
    assert!(snapshot.is_empty());

    assert!(h.fake.calls().is_empty());
}

// ============================================================================
// Stale cart recovery
// ============================================================================

#[tokio::test]
async fn test_stale_add_creates_one_replacement_cart() {
    let h = harness();
    h.cart.add_to_cart(AddToCart::from(STICKER), 1).await.unwrap();
    let old_id = h.cart_id();
    h.fake.expire_cart(&old_id);

    let snapshot = h.cart.add_to_cart(AddToCart::from(TEE_MEDIUM), 3).await.unwrap();

    assert_eq!(h.fake.carts_created(), 2);
    assert_eq!(
        h.fake.cart_mutations().last(),
        Some(&Call::CreateCart {
            lines: vec![(TEE_MEDIUM.to_string(), 3)],
            buyer: None,
        })
    );
    assert_eq!(snapshot.items.len(), 1);
    assert_eq!(snapshot.total_quantity, 3);

    let new_id = h.cart_id();
    assert_ne!(new_id, old_id);
    let stored: Option<CartReference> = load_json(&*h.store, CART_KEY).await.unwrap();
    assert_eq!(stored.unwrap().cart_id, new_id);
    assert_eq!(h.cart.last_error(), None);
}

#[tokio::test]
async fn test_stale_message_from_user_errors_is_recovered() {
    let h = harness();
    h.cart.add_to_cart(AddToCart::from(STICKER), 1).await.unwrap();
    h.fake
        .fail_next(Failure::UserError("The specified cart does not exist.".to_string()));

    h.cart.add_to_cart(AddToCart::from(STICKER), 1).await.unwrap();

    assert_eq!(h.fake.carts_created(), 2);
}

#[tokio::test]
async fn test_stale_add_without_retry_budget() {
    let fake = Arc::new(catalog());
    let store = Arc::new(MemoryStore::new());
    let cart = CartSynchronizer::new(Arc::clone(&fake), Arc::clone(&store))
        .with_retry_policy(RetryPolicy::never());
    cart.add_to_cart(AddToCart::from(STICKER), 1).await.unwrap();
    fake.expire_cart(&cart.reference().unwrap().cart_id);

    let err = cart.add_to_cart(AddToCart::from(STICKER), 1).await.unwrap_err();

    assert!(matches!(err, CartError::StaleReference(_)));
    assert_eq!(fake.carts_created(), 1);
    assert!(cart.reference().is_none());
    assert!(store.get(CART_KEY).await.unwrap().is_none());
}

#[tokio::test]
async fn test_stale_update_resets_without_retry() {
    let h = harness();
    h.cart.add_to_cart(AddToCart::from(STICKER), 1).await.unwrap();
    let line_id = h.cart.snapshot().items[0].line_id.clone();
    h.fake.expire_cart(&h.cart_id());

    let err = h.cart.update_quantity(&line_id, 2).await.unwrap_err();

    assert!(matches!(err, CartError::StaleReference(_)));
    assert!(h.cart.snapshot().is_empty());
    assert!(h.cart.reference().is_none());
    assert!(h.store.get(CART_KEY).await.unwrap().is_none());
    assert_eq!(h.fake.carts_created(), 1);
    assert!(h.cart.last_error().is_some());
}

#[tokio::test]
async fn test_stale_remove_resets_without_retry() {
    let h = harness();
    h.cart.add_to_cart(AddToCart::from(STICKER), 1).await.unwrap();
    let line_id = h.cart.snapshot().items[0].line_id.clone();
    h.fake.expire_cart(&h.cart_id());

    let err = h.cart.remove_line(&line_id).await.unwrap_err();

    assert!(matches!(err, CartError::StaleReference(_)));
    assert!(h.cart.snapshot().is_empty());
    assert!(h.cart.reference().is_none());
    assert_eq!(h.fake.carts_created(), 1);

    // The next add starts over
    h.cart.add_to_cart(AddToCart::from(STICKER), 1).await.unwrap();
    assert_eq!(h.fake.carts_created(), 2);
}

#[tokio::test]
async fn test_concurrent_adds_share_one_replacement_cart() {
    let h = harness();
    h.cart.add_to_cart(AddToCart::from(STICKER), 1).await.unwrap();
    h.fake.expire_cart(&h.cart_id());

    let (a, b) = tokio::join!(
        h.cart.add_to_cart(AddToCart::from(STICKER), 1),
        h.cart.add_to_cart(AddToCart::from(TEE_MEDIUM), 1),
    );
    a.unwrap();
    b.unwrap();

    assert_eq!(h.fake.carts_created(), 2);
    let snapshot = h.cart.snapshot();
    assert_eq!(snapshot.items.len(), 2);
    assert_eq!(snapshot.total_quantity, 2);
}

// ============================================================================
// Failures that are not stale
// ============================================================================

#[tokio::test]
async fn test_network_failure_keeps_reference() {
    let h = harness();
    h.cart.add_to_cart(AddToCart::from(STICKER), 1).await.unwrap();
    let reference = h.cart.reference();
    let before = h.cart.snapshot();
    h.fake.fail_next(Failure::Unavailable);

    let err = h.cart.add_to_cart(AddToCart::from(STICKER), 1).await.unwrap_err();

    assert!(matches!(err, CartError::Network(_)));
    assert_eq!(h.cart.reference(), reference);
    assert_eq!(h.cart.snapshot(), before);
    assert_eq!(h.fake.carts_created(), 1);
    assert!(h.cart.last_error().is_some());
    assert!(!h.cart.is_loading());
}

#[tokio::test]
async fn test_user_error_is_reported_with_message() {
    let h = harness();
    h.cart.add_to_cart(AddToCart::from(STICKER), 1).await.unwrap();

    let err = h
        .cart
        .add_to_cart(AddToCart::from("gid://shopify/ProductVariant/999"), 1)
        .await
        .unwrap_err();

    match err {
        CartError::RemoteUserError(message) => assert!(message.contains("does not exist")),
        other => panic!("expected RemoteUserError, got {other:?}"),
    }
    assert_eq!(h.fake.carts_created(), 1);
    assert!(h.cart.reference().is_some());
}

#[tokio::test]
async fn test_next_mutation_clears_last_error() {
    let h = harness();
    h.fake.fail_next(Failure::Unavailable);
    h.cart.add_to_cart(AddToCart::from(STICKER), 1).await.unwrap_err();
    assert!(h.cart.last_error().is_some());

    h.cart.add_to_cart(AddToCart::from(STICKER), 1).await.unwrap();
    assert_eq!(h.cart.last_error(), None);
}

// ============================================================================
// Clear, restore, refresh
// ============================================================================

#[tokio::test]
async fn test_clear_cart_is_idempotent() {
    let h = harness();
    h.cart.add_to_cart(AddToCart::from(STICKER), 1).await.unwrap();

    for _ in 0..2 {
        h.cart.clear_cart().await.unwrap();
        assert!(h.cart.reference().is_none());
        assert!(h.cart.snapshot().is_empty());
        assert!(h.store.get(CART_KEY).await.unwrap().is_none());
    }
}

#[tokio::test]
async fn test_restore_picks_up_cached_cart() {
    let h = harness();
    h.cart.add_to_cart(AddToCart::from(STICKER), 2).await.unwrap();
    let expected = h.cart.snapshot();

    let restored = CartSynchronizer::new(Arc::clone(&h.fake), Arc::clone(&h.store));
    let snapshot = restored.restore().await.unwrap();

    assert_eq!(snapshot, expected);
    assert_eq!(restored.reference(), h.cart.reference());
}

#[tokio::test]
async fn test_restore_drops_expired_cart() {
    let h = harness();
    h.cart.add_to_cart(AddToCart::from(STICKER), 1).await.unwrap();
    h.fake.expire_cart(&h.cart_id());

    let restored = CartSynchronizer::new(Arc::clone(&h.fake), Arc::clone(&h.store));
    let snapshot = restored.restore().await.unwrap();

    assert!(snapshot.is_empty());
    assert!(restored.reference().is_none());
    assert!(h.store.get(CART_KEY).await.unwrap().is_none());
}

#[tokio::test]
async fn test_restore_drops_unreadable_reference() {
    let h = harness();
    h.store.set(CART_KEY, "not json".to_string()).await.unwrap();

    let snapshot = h.cart.restore().await.unwrap();

    assert!(snapshot.is_empty());
    assert!(h.fake.calls().is_empty());
    assert!(h.store.get(CART_KEY).await.unwrap().is_none());
}

#[tokio::test]
async fn test_refresh_of_expired_cart_resets() {
    let h = harness();
    h.cart.add_to_cart(AddToCart::from(STICKER), 1).await.unwrap();
    h.fake.expire_cart(&h.cart_id());

    let err = h.cart.refresh().await.unwrap_err();

    assert!(matches!(err, CartError::StaleReference(_)));
    assert!(h.cart.snapshot().is_empty());
    assert!(h.cart.reference().is_none());
}

#[tokio::test]
async fn test_cart_survives_process_restart_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    let fake = Arc::new(catalog());

    let first = CartSynchronizer::new(Arc::clone(&fake), Arc::new(FileStore::new(&path)));
    first.add_to_cart(AddToCart::from(STICKER), 1).await.unwrap();

    let second = CartSynchronizer::new(Arc::clone(&fake), Arc::new(FileStore::new(&path)));
    let snapshot = second.restore().await.unwrap();

    assert_eq!(snapshot.total_quantity, 1);
    assert_eq!(second.reference(), first.reference());
}

// ============================================================================
// Customer identity
// ============================================================================

#[tokio::test]
async fn test_sign_in_moves_cart_to_customer() {
    let h = harness();
    h.cart.add_to_cart(AddToCart::from(STICKER), 2).await.unwrap();
    h.cart.add_to_cart(AddToCart::from(TEE_MEDIUM), 1).await.unwrap();
    let old_id = h.cart_id();

    let snapshot = h
        .cart
        .on_authenticated(SecretString::from("tok_customer"))
        .await
        .unwrap();

    assert_eq!(
        h.fake.cart_mutations().last(),
        Some(&Call::CreateCart {
            lines: vec![(STICKER.to_string(), 2), (TEE_MEDIUM.to_string(), 1)],
            buyer: Some("tok_customer".to_string()),
        })
    );
    assert_eq!(snapshot.total_quantity, 3);
    assert_ne!(h.cart_id(), old_id);
}

#[tokio::test]
async fn test_sign_in_with_empty_cart_only_records_identity() {
    let h = harness();

    h.cart
        .on_authenticated(SecretString::from("tok_customer"))
        .await
        .unwrap();
    assert!(h.fake.calls().is_empty());

    h.cart.add_to_cart(AddToCart::from(STICKER), 1).await.unwrap();
    assert_eq!(
        h.fake.cart_mutations(),
        vec![Call::CreateCart {
            lines: vec![(STICKER.to_string(), 1)],
            buyer: Some("tok_customer".to_string()),
        }]
    );
}

#[tokio::test]
async fn test_sign_out_makes_new_carts_anonymous() {
    let h = harness();
    h.cart.resume_identity(SecretString::from("tok_customer"));
    h.cart.on_signed_out();

    h.cart.add_to_cart(AddToCart::from(STICKER), 1).await.unwrap();

    assert_eq!(
        h.fake.cart_mutations(),
        vec![Call::CreateCart {
            lines: vec![(STICKER.to_string(), 1)],
            buyer: None,
        }]
    );
}
