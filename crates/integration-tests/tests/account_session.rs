//! Customer session against an in-memory Storefront API.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use headless_cart::account::{AccountError, AccountSession};
use headless_cart::cart::{AddToCart, CartSynchronizer};
use headless_cart::store::{CUSTOMER_TOKEN_KEY, KeyValueStore, MemoryStore};
use headless_cart_integration_tests::{Call, FakeShopify, Failure, order};
use secrecy::{ExposeSecret, SecretString};

const EMAIL: &str = "jane@example.com";

fn password(s: &str) -> SecretString {
    SecretString::from(s)
}

fn shop() -> FakeShopify {
    FakeShopify::new()
        .with_account(EMAIL, "hunter22", "Jane")
        .with_product(2, "Sticker", &[(21, "Default Title", true, "3.50")])
}

fn session(
    fake: &Arc<FakeShopify>,
    store: &Arc<MemoryStore>,
) -> AccountSession<FakeShopify, MemoryStore> {
    AccountSession::new(Arc::clone(fake), Arc::clone(store))
}

// ============================================================================
// Sign in
// ============================================================================

#[tokio::test]
async fn test_login_loads_profile_and_persists_token() {
    let fake = Arc::new(shop());
    let store = Arc::new(MemoryStore::new());
    let account = session(&fake, &store);

    let customer = account.login(EMAIL, &password("hunter22")).await.unwrap();

    assert_eq!(customer.first_name.as_deref(), Some("Jane"));
    assert!(account.is_authenticated());
    assert_eq!(account.customer(), Some(customer));
    assert!(!account.is_loading());
    assert!(store.get(CUSTOMER_TOKEN_KEY).await.unwrap().is_some());
}

#[tokio::test]
async fn test_login_normalizes_email() {
    let fake = Arc::new(shop());
    let account = session(&fake, &Arc::new(MemoryStore::new()));

    account
        .login("  jane@Example.COM ", &password("hunter22"))
        .await
        .unwrap();

    assert_eq!(fake.calls()[0], Call::CreateAccessToken(EMAIL.to_string()));
}

#[tokio::test]
async fn test_login_with_wrong_password_is_rejected() {
    let fake = Arc::new(shop());
    let store = Arc::new(MemoryStore::new());
    let account = session(&fake, &store);

    let err = account.login(EMAIL, &password("nope")).await.unwrap_err();

    match &err {
        AccountError::Rejected(message) => assert_eq!(message, "Unidentified customer"),
        other => panic!("expected Rejected, got {other:?}"),
    }
    assert!(!account.is_authenticated());
    assert_eq!(account.last_error(), Some("Unidentified customer".to_string()));
    assert!(store.get(CUSTOMER_TOKEN_KEY).await.unwrap().is_none());
}

#[tokio::test]
async fn test_invalid_email_is_rejected_before_any_call() {
    let fake = Arc::new(shop());
    let account = session(&fake, &Arc::new(MemoryStore::new()));

    let err = account.login("not-an-email", &password("x")).await.unwrap_err();

    assert!(matches!(err, AccountError::InvalidEmail(_)));
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn test_login_network_failure() {
    let fake = Arc::new(shop());
    let account = session(&fake, &Arc::new(MemoryStore::new()));
    fake.fail_next(Failure::Unavailable);

    let err = account.login(EMAIL, &password("hunter22")).await.unwrap_err();

    assert!(matches!(err, AccountError::Network(_)));
    assert!(!account.is_authenticated());
}

#[tokio::test]
async fn test_token_without_profile_is_not_authenticated() {
    let fake = Arc::new(shop());
    let store = Arc::new(MemoryStore::new());
    let account = session(&fake, &store);
    account.login(EMAIL, &password("hunter22")).await.unwrap();
    fake.revoke_tokens();

    let restored = session(&fake, &store);
    assert_eq!(restored.restore().await.unwrap(), None);

    assert!(!restored.is_authenticated());
    assert!(restored.access_token().is_none());
    assert!(store.get(CUSTOMER_TOKEN_KEY).await.unwrap().is_none());
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_register_opts_in_and_signs_in() {
    let fake = Arc::new(shop());
    let account = session(&fake, &Arc::new(MemoryStore::new()));

    let customer = account
        .register("Sam", "Lee", "sam@example.com", &password("pa55word"))
        .await
        .unwrap();

    assert_eq!(customer.display_name, "Sam Lee");
    assert!(account.is_authenticated());
    match &fake.calls()[0] {
        Call::CreateCustomer(new) => {
            assert!(new.accepts_marketing);
            assert_eq!(new.email.as_str(), "sam@example.com");
        }
        other => panic!("expected CreateCustomer, got {other:?}"),
    }
    assert!(matches!(fake.calls()[1], Call::CreateAccessToken(_)));
}

#[tokio::test]
async fn test_register_taken_email() {
    let fake = Arc::new(shop());
    let account = session(&fake, &Arc::new(MemoryStore::new()));

    let err = account
        .register("Jane", "Doe", EMAIL, &password("pa55word"))
        .await
        .unwrap_err();

    assert!(matches!(err, AccountError::Rejected(ref m) if m == "Email has already been taken"));
    assert!(!account.is_authenticated());
    assert_eq!(fake.calls().len(), 1);
}

// ============================================================================
// Restore and sign out
// ============================================================================

#[tokio::test]
async fn test_restore_resumes_session() {
    let fake = Arc::new(shop());
    let store = Arc::new(MemoryStore::new());
    let account = session(&fake, &store);
    let customer = account.login(EMAIL, &password("hunter22")).await.unwrap();

    let restored = session(&fake, &store);
    assert_eq!(restored.restore().await.unwrap(), Some(customer));
    assert!(restored.is_authenticated());
    assert_eq!(
        restored.access_token().unwrap().expose_secret(),
        account.access_token().unwrap().expose_secret()
    );
}

#[tokio::test]
async fn test_restore_discards_expired_token() {
    let fake = Arc::new(shop().with_token_expiry("2020-01-01T00:00:00Z"));
    let store = Arc::new(MemoryStore::new());
    session(&fake, &store)
        .login(EMAIL, &password("hunter22"))
        .await
        .unwrap();
    let calls = fake.calls().len();

    let restored = session(&fake, &store);
    assert_eq!(restored.restore().await.unwrap(), None);

    assert_eq!(fake.calls().len(), calls);
    assert!(store.get(CUSTOMER_TOKEN_KEY).await.unwrap().is_none());
}

#[tokio::test]
async fn test_restore_with_nothing_stored() {
    let fake = Arc::new(shop());
    let account = session(&fake, &Arc::new(MemoryStore::new()));

    assert_eq!(account.restore().await.unwrap(), None);
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn test_logout_revokes_token_and_clears_store() {
    let fake = Arc::new(shop());
    let store = Arc::new(MemoryStore::new());
    let account = session(&fake, &store);
    account.login(EMAIL, &password("hunter22")).await.unwrap();
    let token = account.access_token().unwrap().expose_secret().to_string();

    account.logout().await.unwrap();

    assert!(!account.is_authenticated());
    assert!(account.customer().is_none());
    assert!(store.get(CUSTOMER_TOKEN_KEY).await.unwrap().is_none());
    assert_eq!(fake.calls().last(), Some(&Call::DeleteAccessToken(token)));
}

#[tokio::test]
async fn test_logout_succeeds_when_revocation_fails() {
    let fake = Arc::new(shop());
    let store = Arc::new(MemoryStore::new());
    let account = session(&fake, &store);
    account.login(EMAIL, &password("hunter22")).await.unwrap();
    fake.fail_next(Failure::Unavailable);

    account.logout().await.unwrap();

    assert!(!account.is_authenticated());
    assert!(store.get(CUSTOMER_TOKEN_KEY).await.unwrap().is_none());
}

// ============================================================================
// Orders
// ============================================================================

#[tokio::test]
async fn test_orders_require_sign_in() {
    let fake = Arc::new(shop());
    let account = session(&fake, &Arc::new(MemoryStore::new()));

    let err = account.orders(10, None).await.unwrap_err();

    assert!(matches!(err, AccountError::NotAuthenticated));
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn test_orders_page_size_is_bounded() {
    let fake = Arc::new(shop());
    let account = session(&fake, &Arc::new(MemoryStore::new()));
    account.login(EMAIL, &password("hunter22")).await.unwrap();

    for first in [0, 251] {
        let err = account.orders(first, None).await.unwrap_err();
        assert!(matches!(err, AccountError::InvalidPageSize(n) if n == first));
    }
}

#[tokio::test]
async fn test_orders_paginate() {
    let fake = Arc::new(shop().with_orders(vec![
        order(1003, "42.00"),
        order(1002, "18.50"),
        order(1001, "7.00"),
    ]));
    let account = session(&fake, &Arc::new(MemoryStore::new()));
    account.login(EMAIL, &password("hunter22")).await.unwrap();

    let page = account.orders(2, None).await.unwrap();
    assert_eq!(page.orders.len(), 2);
    assert_eq!(page.orders[0].order_number, 1003);
    assert!(page.page_info.has_next_page);

    let next = account
        .orders(2, page.page_info.end_cursor.clone())
        .await
        .unwrap();
    assert_eq!(next.orders.len(), 1);
    assert_eq!(next.orders[0].order_number, 1001);
    assert!(!next.page_info.has_next_page);
}

#[tokio::test]
async fn test_orders_with_revoked_token() {
    let fake = Arc::new(shop());
    let account = session(&fake, &Arc::new(MemoryStore::new()));
    account.login(EMAIL, &password("hunter22")).await.unwrap();
    fake.revoke_tokens();

    let err = account.orders(5, None).await.unwrap_err();

    assert!(matches!(err, AccountError::SessionExpired));
}

// ============================================================================
// Session and cart together
// ============================================================================

#[tokio::test]
async fn test_login_hands_cart_to_customer() {
    let fake = Arc::new(shop());
    let store = Arc::new(MemoryStore::new());
    let account = session(&fake, &store);
    let cart = CartSynchronizer::new(Arc::clone(&fake), Arc::clone(&store));

    cart.add_to_cart(
        AddToCart::from("gid://shopify/ProductVariant/21"),
        2,
    )
    .await
    .unwrap();
    account.login(EMAIL, &password("hunter22")).await.unwrap();
    let token = account.access_token().unwrap();
    cart.on_authenticated(token.clone()).await.unwrap();

    assert_eq!(
        fake.cart_mutations().last(),
        Some(&Call::CreateCart {
            lines: vec![("gid://shopify/ProductVariant/21".to_string(), 2)],
            buyer: Some(token.expose_secret().to_string()),
        })
    );
    assert_eq!(cart.snapshot().total_quantity, 2);

    // Cart and session live side by side in the same store
    assert!(store.len() >= 2);
}
